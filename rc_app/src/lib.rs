//! # rc_app
//!
//! Load driver and process plumbing around the rolling counter

pub mod cli;
pub mod config_loader;
pub mod driver;
pub mod shutdown_handler;
pub mod tracing_setup;
