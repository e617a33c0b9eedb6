use std::path::Path;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;

use crate::driver::DriverConfig;

/// Config file read by `rc_driver` when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/driver.toml";

/// Prefix for environment overrides, e.g. `RC_DRIVER_LIMIT=20` or `RC_DRIVER_COUNTER__NUM_BUCKETS=20`
pub const ENV_PREFIX: &str = "RC_DRIVER";

/// Load driver settings from a file, with environment variables layered on top
pub fn load_driver_config<P: AsRef<Path>>(path: P) -> Result<DriverConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path.as_ref()))
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__").try_parsing(true))
        .build()?;

    config.try_deserialize()
}

/// Load driver config with fallback to default
pub fn load_driver_config_or_default(path: &str) -> DriverConfig {
    match load_driver_config(path) {
        Ok(config) => {
            tracing::info!("Loaded driver config from {path}");
            config
        }
        Err(err) => {
            tracing::warn!("Failed to load driver config from {}: {}. Using defaults.", path, err);
            DriverConfig::default()
        }
    }
}
