#![cfg(not(tarpaulin_include))]

use sales_dashboard::{Config, app};

/// Main entry point for the dashboard server
///
/// Reads the configuration from the command line and environment, then serves
/// the dashboard until the process is stopped.
///
/// # Arguments
/// * `--addr`, `--data`, `--top`, `--currency`, `--max-datasets`, `--max-upload-mb`
///
/// # Environment
/// * `RUST_LOG` - log filter, `info` by default
/// * `DASHBOARD_ADDR`, `DASHBOARD_DATA` - defaults for `--addr` and `--data`
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    app::run(config).await
}
