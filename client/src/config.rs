//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5001";
pub const DEFAULT_EXPORT_DIR: &str = ".";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const SESSION_DIR_NAME: &str = ".feedback-desk";
pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },

    /// Neither `FEEDBACK_SESSION_FILE` nor `HOME` is set.
    #[error("cannot locate session file: set FEEDBACK_SESSION_FILE or HOME")]
    NoSessionPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without a trailing slash.
    pub api_url: String,
    pub session_file: PathBuf,
    pub export_dir: PathBuf,
    /// Whether batch reports may use the table layout.
    pub export_tables: bool,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// - `FEEDBACK_API_URL`: default `http://localhost:5001`
    /// - `FEEDBACK_SESSION_FILE`: default `$HOME/.feedback-desk/session.json`
    /// - `FEEDBACK_EXPORT_DIR`: default `.`
    /// - `FEEDBACK_EXPORT_TABLES`: `1/true/yes/on` or `0/false/no/off`, default on
    /// - `FEEDBACK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `FEEDBACK_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error when no session path can be derived or a boolean
    /// variable holds an unrecognized value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = normalize_base_url(&lookup("FEEDBACK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()));

        let session_file = match lookup("FEEDBACK_SESSION_FILE").filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => {
                let home = lookup("HOME").filter(|v| !v.trim().is_empty()).ok_or(ConfigError::NoSessionPath)?;
                PathBuf::from(home).join(SESSION_DIR_NAME).join(SESSION_FILE_NAME)
            }
        };

        let export_dir = PathBuf::from(lookup("FEEDBACK_EXPORT_DIR").unwrap_or_else(|| DEFAULT_EXPORT_DIR.to_owned()));

        let export_tables = match lookup("FEEDBACK_EXPORT_TABLES") {
            Some(raw) => env_bool(&raw).ok_or_else(|| ConfigError::Invalid { var: "FEEDBACK_EXPORT_TABLES", value: raw })?,
            None => true,
        };

        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("FEEDBACK_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("FEEDBACK_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url, session_file, export_dir, export_tables, timeouts })
    }

    /// Config pointing at `api_url` with every other setting defaulted and
    /// the session file placed in the system temp directory.
    #[must_use]
    pub fn for_base_url(api_url: &str) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            session_file: std::env::temp_dir().join(SESSION_DIR_NAME).join(SESSION_FILE_NAME),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            export_tables: true,
            timeouts: Timeouts::default(),
        }
    }
}

/// Lenient boolean: `1/true/yes/on` and `0/false/no/off`, case-insensitive.
#[must_use]
pub fn env_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
