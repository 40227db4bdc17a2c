//! Configuration module
//!
//! Client-side settings: which API to talk to, where the session token is
//! persisted, request timeout and the live-alerts refresh interval.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    APP_DIR_NAME, DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS,
    TOKEN_STORAGE_KEY,
};
use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub token_path: PathBuf,
    pub http_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl ClientConfig {
    /// Load from `.env` and the process environment.
    ///
    /// - `INCIALERT_API_URL` (default `http://localhost:5000`)
    /// - `INCIALERT_TOKEN_PATH` (default `<data dir>/incialert/auth_token`)
    /// - `INCIALERT_HTTP_TIMEOUT_SECS` (default 60)
    /// - `INCIALERT_POLL_INTERVAL_SECS` (default 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("INCIALERT_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let token_path = match env::var("INCIALERT_TOKEN_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_token_path()?,
        };

        Ok(Self {
            api_url,
            token_path,
            http_timeout_secs: parse_secs("INCIALERT_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            poll_interval_secs: parse_secs(
                "INCIALERT_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_BASE_URL.to_string(),
            token_path: default_token_path()
                .unwrap_or_else(|_| PathBuf::from(TOKEN_STORAGE_KEY)),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

fn default_token_path() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(TOKEN_STORAGE_KEY))
        .ok_or(ConfigError::NoDataDir)
}

fn parse_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
        Err(_) => Ok(default),
    }
}
