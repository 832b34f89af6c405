//! Process configuration, read from the environment once at startup.

use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

pub const API_KEY_VAR: &str = "SCRAPINGBEE_API_KEY";
pub const BASE_URL_VAR: &str = "TIERFETCH_BASE_URL";
pub const TIMEOUT_VAR: &str = "TIERFETCH_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://app.scrapingbee.com/api/v1/";
/// Rendering plus the wait tier can take tens of seconds on the backend side.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: Url,
    /// Upper bound for a single tier attempt.
    pub timeout: Duration,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|e| ConfigError::Invalid {
            name: BASE_URL_VAR,
            reason: e.to_string(),
        })?;
        Ok(Self {
            api_key: api_key.into(),
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(API_KEY_VAR))?;

        let mut config = Self::new(api_key)?;

        if let Some(raw) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.base_url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
                name: BASE_URL_VAR,
                reason: e.to_string(),
            })?;
        }

        if let Some(raw) = lookup(TIMEOUT_VAR).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: TIMEOUT_VAR,
                reason: format!("expected whole seconds, got {raw:?}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: TIMEOUT_VAR,
                    reason: "must be greater than zero".into(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}
