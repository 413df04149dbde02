//! Runtime configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `EVENTI_DATA_DIR` | `./data` (relative paths resolve against the working directory) |
//! | `EVENTI_BIND` | `0.0.0.0:8080` |
//! | `EVENTI_ARCHIVER_INTERVAL_SECS` | `60` (must be positive) |
//! | `EVENTI_SYNC_INTERVAL_SECS` | `30` (must be positive) |
//! | `EVENTI_SNAPSHOT_THRESHOLD` | `1000` |
//! | `EVENTI_ARCHIVE_KEEP` | `5` |

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::journal::JournalConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub archiver_interval: Duration,
    pub sync_interval: Duration,
    pub snapshot_threshold: usize,
    pub archive_keep: usize,
}

impl AppConfig {
    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(&current_dir, |key| env::var(key).ok())
    }

    /// Build a config from `lookup`, resolving relative paths against `base`
    pub fn from_lookup<F>(base: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup("EVENTI_DATA_DIR") {
            Some(path) if Path::new(&path).is_absolute() => PathBuf::from(path),
            Some(path) => base.join(path),
            None => base.join("data"),
        };

        Ok(Self {
            data_dir,
            bind: parse(&lookup, "EVENTI_BIND", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            archiver_interval: parse_interval(&lookup, "EVENTI_ARCHIVER_INTERVAL_SECS", 60)?,
            sync_interval: parse_interval(&lookup, "EVENTI_SYNC_INTERVAL_SECS", 30)?,
            snapshot_threshold: parse(&lookup, "EVENTI_SNAPSHOT_THRESHOLD", 1000)?,
            archive_keep: parse(&lookup, "EVENTI_ARCHIVE_KEEP", 5)?,
        })
    }

    pub fn journal_config(&self) -> JournalConfig {
        let mut config =
            JournalConfig::new(&self.data_dir).with_snapshot_threshold(self.snapshot_threshold);
        config.archive_keep = self.archive_keep;
        config
    }

    pub fn index_dir(&self) -> PathBuf {
        self.journal_config().index_dir()
    }
}

fn parse<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

/// Whole seconds, at least one
fn parse_interval<F>(lookup: &F, var: &'static str, default_secs: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse(lookup, var, default_secs)? {
        0 => Err(ConfigError::Invalid {
            var,
            value: "0".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}
