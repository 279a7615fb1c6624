//! Runtime settings, read from the process environment.
//!
//! Every value is validated here so that a bad format or destination stops
//! the run before any query or write happens.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::domains::export::types::FileFormat;
use crate::errors::{ConfigError, ConfigResult};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LIMIT: i64 = 10;

/// Where exported files are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    S3 { bucket: String },
    Local { directory: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub log_level: String,
    /// Maximum number of pending jobs picked up by one batch
    pub limit: i64,
    pub write_file_format: FileFormat,
    pub destination: Destination,
    pub job_timeout: Option<Duration>,
}

impl Settings {
    /// Load from the environment, seeding it from `.env` when present.
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_map(values: &HashMap<String, String>) -> ConfigResult<Self> {
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| ConfigError::missing("DATABASE_URL"))?;
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let limit = match get("LIMIT") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(ConfigError::invalid("LIMIT", &raw, "must be a positive integer")),
            },
            None => DEFAULT_LIMIT,
        };

        let write_file_format = match get("WRITE_FILE_FORMAT") {
            Some(raw) => raw.parse::<FileFormat>()?,
            None => FileFormat::Parquet,
        };

        let location = get("WRITE_FILE_LOCATION").unwrap_or_else(|| "local".to_string());
        let location_key = location.trim().to_ascii_lowercase();
        let destination = match location_key.as_str() {
            "s3" => Destination::S3 {
                bucket: get("OPEN_DATA_BUCKET").ok_or_else(|| ConfigError::missing("OPEN_DATA_BUCKET"))?,
            },
            "local" => Destination::Local {
                directory: get("LOCAL_SAVE_DIRECTORY")
                    .map(PathBuf::from)
                    .ok_or_else(|| ConfigError::missing("LOCAL_SAVE_DIRECTORY"))?,
            },
            _ => return Err(ConfigError::UnsupportedDestination(location)),
        };

        let job_timeout = match get("JOB_TIMEOUT_SECONDS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::invalid(
                        "JOB_TIMEOUT_SECONDS",
                        &raw,
                        "must be a positive number of seconds",
                    ))
                }
            },
            None => None,
        };

        Ok(Self {
            database_url,
            log_level,
            limit,
            write_file_format,
            destination,
            job_timeout,
        })
    }
}
