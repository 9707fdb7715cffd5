//! Poster configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use frontpage_identity::{ResolverConfig, DEFAULT_PLC_DIRECTORY, DEFAULT_RESOLVE_HANDLE_ENDPOINT};
use frontpage_session::token::DEFAULT_EXPIRY_SKEW_SECS;

use crate::error::CoreError;
use crate::Result;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the credential database
    pub database_path: PathBuf,
    /// `com.atproto.identity.resolveHandle` endpoint
    pub resolve_handle_endpoint: String,
    /// PLC directory base URL
    pub plc_directory_url: String,
    /// Per-request timeout applied by the HTTP client
    pub request_timeout_secs: u64,
    /// Access tokens expiring within this window are refreshed before use
    pub token_expiry_skew_secs: i64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("frontpage.db"),
            resolve_handle_endpoint: DEFAULT_RESOLVE_HANDLE_ENDPOINT.to_string(),
            plc_directory_url: DEFAULT_PLC_DIRECTORY.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_expiry_skew_secs: DEFAULT_EXPIRY_SKEW_SECS,
        }
    }

    pub fn data_dir() -> PathBuf {
        Self::data_dir_from(|key| std::env::var(key).ok())
    }

    /// Defaults with `FRONTPAGE_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(Self::data_dir_from(&lookup));

        if let Some(endpoint) = non_empty(lookup("FRONTPAGE_RESOLVE_ENDPOINT")) {
            config.resolve_handle_endpoint = endpoint;
        }
        if let Some(directory) = non_empty(lookup("FRONTPAGE_PLC_DIRECTORY")) {
            config.plc_directory_url = directory;
        }
        if let Some(raw) = non_empty(lookup("FRONTPAGE_REQUEST_TIMEOUT_SECS")) {
            config.request_timeout_secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    CoreError::Config(format!(
                        "FRONTPAGE_REQUEST_TIMEOUT_SECS is not a positive integer: {raw}"
                    ))
                })?;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            resolve_handle_endpoint: self.resolve_handle_endpoint.clone(),
            plc_directory_url: self.plc_directory_url.clone(),
        }
    }

    fn data_dir_from<F>(lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = non_empty(lookup("FRONTPAGE_DATA_DIR")) {
            return PathBuf::from(dir);
        }
        dirs::data_local_dir(&lookup)
            .map(|d| d.join("frontpage-poster"))
            .unwrap_or_else(|| PathBuf::from(".frontpage-poster"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Per-platform data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir<F>(lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        #[cfg(target_os = "windows")]
        {
            lookup("LOCALAPPDATA").map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            lookup("HOME").map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            lookup("XDG_DATA_HOME")
                .map(PathBuf::from)
                .or_else(|| lookup("HOME").map(|h| PathBuf::from(h).join(".local/share")))
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            let _ = lookup;
            None
        }
    }
}
