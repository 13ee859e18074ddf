use crate::error::{DashboardError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings for the dashboard server.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub addr: SocketAddr,
    /// Fixed CSV file served as the `local` dataset, if any.
    pub data_path: Option<PathBuf>,
    /// Length of the ranking sections.
    pub top_n: usize,
    /// Prefix for monetary amounts.
    pub currency: String,
    /// Uploaded datasets kept in memory before the oldest is evicted.
    pub max_datasets: usize,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_path: None,
            top_n: 10,
            currency: "Rp".to_string(),
            max_datasets: 16,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Build the configuration from the process arguments and environment.
    ///
    /// `DASHBOARD_ADDR` and `DASHBOARD_DATA` supply defaults that flags override.
    pub fn from_env() -> Result<Self> {
        let env_addr = std::env::var("DASHBOARD_ADDR").ok();
        let env_data = std::env::var("DASHBOARD_DATA").ok();
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse(&args, env_addr.as_deref(), env_data.as_deref())
    }

    /// Parse flags of the form `--name value`.
    ///
    /// Recognised flags: `--addr`, `--data`, `--top`, `--currency`,
    /// `--max-datasets`, `--max-upload-mb`.
    pub fn parse(args: &[String], env_addr: Option<&str>, env_data: Option<&str>) -> Result<Self> {
        let mut config = Config::default();
        config.addr = parse_addr(env_addr.unwrap_or(DEFAULT_ADDR))?;
        config.data_path = env_data.filter(|p| !p.is_empty()).map(PathBuf::from);

        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .ok_or_else(|| DashboardError::Config(format!("{} needs a value", flag)))
            };
            match flag.as_str() {
                "--addr" => config.addr = parse_addr(value()?)?,
                "--data" => config.data_path = Some(PathBuf::from(value()?)),
                "--top" => config.top_n = parse_positive(flag, value()?)?,
                "--currency" => config.currency = value()?.clone(),
                "--max-datasets" => config.max_datasets = parse_positive(flag, value()?)?,
                "--max-upload-mb" => {
                    config.max_upload_bytes = parse_positive(flag, value()?)? * 1024 * 1024
                }
                other => {
                    return Err(DashboardError::Config(format!("unknown argument '{}'", other)));
                }
            }
        }

        Ok(config)
    }
}

fn parse_addr(text: &str) -> Result<SocketAddr> {
    text.parse()
        .map_err(|_| DashboardError::Config(format!("invalid listen address '{}'", text)))
}

fn parse_positive(flag: &str, text: &str) -> Result<usize> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(DashboardError::Config(format!(
            "{} expects a positive integer, got '{}'",
            flag, text
        ))),
    }
}
