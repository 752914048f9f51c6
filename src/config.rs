//! Runtime settings, read from the process environment after an optional
//! `.env` file has been loaded.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FDPSHEET_BEE_URL` | `http://localhost:1633` |
//! | `FDPSHEET_POSTAGE_STAMP_ID` | unset |
//! | `FDPSHEET_DATA_DIR` | `.fdpsheet` |
//! | `FDPSHEET_RPC_URL` | `http://localhost:9545` |
//! | `FDPSHEET_FUNDING_KEY` | the first account of the local development chain |
//! | `FDPSHEET_CONFIRM_TIMEOUT_SECS` | `60` |
//! | `FDPSHEET_CONFIRM_POLL_MILLIS` | `500` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_BEE_URL: &str = "http://localhost:1633";
pub const DEFAULT_RPC_URL: &str = "http://localhost:9545";
pub const DEFAULT_DATA_DIR: &str = ".fdpsheet";
pub const DEFAULT_FUNDING_KEY: &str =
    "0x4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";
/// 0.1 ether.
pub const DEFAULT_FUNDING_AMOUNT_WEI: u128 = 100_000_000_000_000_000;
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub bee_url: String,
    pub postage_stamp_id: Option<String>,
    pub data_dir: PathBuf,
}

impl NetworkConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bee_url: lookup("FDPSHEET_BEE_URL").unwrap_or_else(|| DEFAULT_BEE_URL.to_string()),
            postage_stamp_id: lookup("FDPSHEET_POSTAGE_STAMP_ID").filter(|id| !id.is_empty()),
            data_dir: lookup("FDPSHEET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub rpc_url: String,
    pub funding_key: String,
    pub funding_amount_wei: u128,
    pub confirm_poll_interval: Duration,
    pub confirm_timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            funding_key: DEFAULT_FUNDING_KEY.to_string(),
            funding_amount_wei: DEFAULT_FUNDING_AMOUNT_WEI,
            confirm_poll_interval: DEFAULT_CONFIRM_POLL_INTERVAL,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }
}

impl ProvisionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let confirm_timeout = match lookup("FDPSHEET_CONFIRM_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_positive("FDPSHEET_CONFIRM_TIMEOUT_SECS", value)?),
            None => defaults.confirm_timeout,
        };
        let confirm_poll_interval = match lookup("FDPSHEET_CONFIRM_POLL_MILLIS") {
            Some(value) => {
                Duration::from_millis(parse_positive("FDPSHEET_CONFIRM_POLL_MILLIS", value)?)
            }
            None => defaults.confirm_poll_interval,
        };

        Ok(Self {
            rpc_url: lookup("FDPSHEET_RPC_URL").unwrap_or(defaults.rpc_url),
            funding_key: lookup("FDPSHEET_FUNDING_KEY").unwrap_or(defaults.funding_key),
            funding_amount_wei: defaults.funding_amount_wei,
            confirm_poll_interval,
            confirm_timeout,
        })
    }
}

fn parse_positive(name: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}

/// What happened when looking for a `.env` file. Loading runs before the
/// subscriber is installed, so the outcome is logged afterwards.
#[derive(Debug)]
pub enum EnvFile {
    Loaded(PathBuf),
    NotFound,
    Failed(dotenvy::Error),
}

impl EnvFile {
    fn from_error(err: dotenvy::Error) -> Self {
        if err.not_found() {
            Self::NotFound
        } else {
            Self::Failed(err)
        }
    }

    pub fn log(&self) {
        match self {
            Self::Loaded(path) => debug!(path = %path.display(), "loaded environment file"),
            Self::NotFound => {}
            Self::Failed(err) => warn!(%err, "failed to load environment file"),
        }
    }
}

/// Loads `.env` from the working directory or its parents, if there is one.
/// Variables already set in the process win.
pub fn load_dotenv() -> EnvFile {
    match dotenvy::dotenv() {
        Ok(path) => EnvFile::Loaded(path),
        Err(err) => EnvFile::from_error(err),
    }
}

pub fn load_dotenv_from(path: impl AsRef<Path>) -> EnvFile {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => EnvFile::Loaded(path.to_path_buf()),
        Err(err) => EnvFile::from_error(err),
    }
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
