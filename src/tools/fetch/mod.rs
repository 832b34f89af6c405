mod backend;
mod client;
mod strategies;
mod tiers;
mod utils;

pub mod cli;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export types for public use
pub use backend::{Backend, BackendResponse, ScrapingBeeBackend};
pub use strategies::Ladder;
pub use tiers::{LADDER, WAIT_TIER_MS};
pub use types::*;
pub use utils::{blocked_pattern, body_looks_blocked, BLOCK_PATTERNS};

use crate::config::Config;
use std::sync::Arc;

/// Build a ladder backed by the configured scraping service.
pub fn ladder_from_config(config: &Config) -> crate::Result<Ladder> {
    let backend = ScrapingBeeBackend::new(config)?;
    Ok(Ladder::new(Arc::new(backend)).with_attempt_timeout(config.timeout))
}
