use crate::tools::fetch::{Tier, TierFailure};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TierfetchError>;

#[derive(Debug, Error)]
pub enum TierfetchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Startup configuration problems. These are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Transport-level failure of a single backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build client: {0}")]
    Client(String),
    #[error("HTTP request failed: {0}")]
    Network(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("unreadable response: {0}")]
    Body(String),
}

/// Terminal outcome of a ladder run that produced no usable page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("all {} tiers failed; last tier {tier}: {last_error}", .failures.len())]
    Exhausted {
        tier: Tier,
        last_error: String,
        failures: Vec<TierFailure>,
    },
    #[error("fetch cancelled at tier {tier}")]
    Cancelled { tier: Tier },
}

impl FetchError {
    /// Tier the ladder was on when it stopped.
    pub fn tier(&self) -> Tier {
        match self {
            FetchError::Exhausted { tier, .. } | FetchError::Cancelled { tier } => *tier,
        }
    }
}
