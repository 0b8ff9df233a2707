use crate::error::{Result, ShopError};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SESSION_FILE: &str = ".shopdesk/session.json";

/// Settings of the shared HTTP client and the session store.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

fn secs_from(value: Option<String>, name: &str, default: u64) -> Result<Duration> {
    match value {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ShopError::Config(format!("{name} must be a whole number of seconds"))),
    }
}

impl ClientConfig {
    /// Loads settings from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            api_url: lookup("SHOPDESK_API_URL").unwrap_or(defaults.api_url),
            connect_timeout: secs_from(
                lookup("SHOPDESK_CONNECT_TIMEOUT_SECS"),
                "SHOPDESK_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
            response_timeout: secs_from(
                lookup("SHOPDESK_RESPONSE_TIMEOUT_SECS"),
                "SHOPDESK_RESPONSE_TIMEOUT_SECS",
                DEFAULT_RESPONSE_TIMEOUT_SECS,
            )?,
            session_file: lookup("SHOPDESK_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ShopError::Config(format!(
                "API url must start with http:// or https://, got {}",
                self.api_url
            )));
        }
        Ok(())
    }

    /// `api_url` without a trailing slash, ready for path joining.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
