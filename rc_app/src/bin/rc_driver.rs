use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use rc_app::cli;
use rc_app::config_loader;
use rc_app::driver;
use rc_app::shutdown_handler;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep guard alive for the whole run so the file writer flushes
    let _guard = rc_app::tracing_setup::init_with_stdout("rc_driver", "./logs", tracing::Level::INFO);

    let config_path = cli::get_config_path(config_loader::DEFAULT_CONFIG_PATH);
    let config = config_loader::load_driver_config_or_default(&config_path);

    info!(
        "Starting driver: {} workers x {} requests, limit {} per {}ms window in {} buckets",
        config.workers, config.requests_per_worker, config.limit, config.counter.window_ms, config.counter.num_buckets
    );

    let running = Arc::new(AtomicBool::new(true));
    shutdown_handler::setup(Arc::clone(&running))?;

    let report = driver::run(&config, running)?;

    info!(
        "Driver finished: admitted={}, rejected={}, rolling_sum={}",
        report.admitted, report.rejected, report.final_sum
    );

    Ok(())
}
