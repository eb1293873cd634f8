//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8123/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 600;

const STORAGE_DIR_NAME: &str = "codegenie";

/// Errors produced while assembling a [`ClientConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `CODEGENIE_BASE_URL` was set but blank.
    #[error("CODEGENIE_BASE_URL must not be empty")]
    EmptyBaseUrl,

    /// No platform config directory and no explicit override.
    #[error("no storage directory available; set CODEGENIE_STORAGE_DIR")]
    NoStorageDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
    /// Upper bound for a whole code-generation event stream.
    pub stream_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            stream_secs: DEFAULT_STREAM_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root, without a trailing slash (e.g. `http://localhost:8123/api`).
    pub base_url: String,
    /// Directory holding the persisted session files.
    pub storage_dir: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CODEGENIE_BASE_URL`: default `http://localhost:8123/api`
    /// - `CODEGENIE_STORAGE_DIR`: default `<platform config dir>/codegenie`
    /// - `CODEGENIE_REQUEST_TIMEOUT_SECS`: default 60
    /// - `CODEGENIE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CODEGENIE_STREAM_TIMEOUT_SECS`: default 600
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is blank or no storage directory can
    /// be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::config_dir())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// `config_dir` is the platform fallback used when
    /// `CODEGENIE_STORAGE_DIR` is absent.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F, config_dir: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = match lookup("CODEGENIE_BASE_URL") {
            Some(raw) => normalize_base_url(&raw).ok_or(ConfigError::EmptyBaseUrl)?,
            None => DEFAULT_BASE_URL.to_owned(),
        };

        let storage_dir = match lookup("CODEGENIE_STORAGE_DIR").filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => PathBuf::from(raw.trim()),
            None => config_dir
                .map(|dir| dir.join(STORAGE_DIR_NAME))
                .ok_or(ConfigError::NoStorageDir)?,
        };

        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("CODEGENIE_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("CODEGENIE_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
            stream_secs: parse_u64(lookup("CODEGENIE_STREAM_TIMEOUT_SECS"), DEFAULT_STREAM_TIMEOUT_SECS),
        };

        Ok(Self { base_url, storage_dir, timeouts })
    }
}

/// Trim whitespace and trailing slashes; `None` when nothing is left.
#[must_use]
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
