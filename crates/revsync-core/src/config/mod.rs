//! Runtime configuration for revsync processes.
//!
//! Operator settings (API key, place ID, frequency) live in the database; this
//! covers process-level knobs read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::places::DEFAULT_DETAILS_ENDPOINT;
use crate::trigger::DEFAULT_LOCK_STALE_SECS;
use crate::util::{is_http_url, normalize_text_option};

pub const DB_PATH_ENV: &str = "REVSYNC_DB_PATH";
pub const PLACES_ENDPOINT_ENV: &str = "REVSYNC_PLACES_ENDPOINT";
pub const POLL_INTERVAL_ENV: &str = "REVSYNC_POLL_INTERVAL_SECS";
pub const LOCK_STALE_ENV: &str = "REVSYNC_LOCK_STALE_SECS";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DB_FILE_NAME: &str = "revsync.db";

/// Process configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub places_endpoint: String,
    pub poll_interval: Duration,
    pub lock_stale_after_secs: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            places_endpoint: DEFAULT_DETAILS_ENDPOINT.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            lock_stale_after_secs: DEFAULT_LOCK_STALE_SECS,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset or blank values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        let get = |key: &str| normalize_text_option(lookup(key));

        if let Some(path) = get(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(endpoint) = get(PLACES_ENDPOINT_ENV) {
            if !is_http_url(&endpoint) {
                return Err(format!(
                    "{PLACES_ENDPOINT_ENV} must include http:// or https://"
                ));
            }
            config.places_endpoint = endpoint;
        }

        if let Some(raw) = get(POLL_INTERVAL_ENV) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| format!("{POLL_INTERVAL_ENV} must be a positive integer"))?;
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(raw) = get(LOCK_STALE_ENV) {
            config.lock_stale_after_secs = raw
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| format!("{LOCK_STALE_ENV} must be a positive integer"))?;
        }

        Ok(config)
    }

    /// Override the database path (e.g. from a CLI flag)
    #[must_use]
    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        self
    }
}

/// Platform data directory location of the database
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("revsync")
        .join(DB_FILE_NAME)
}
