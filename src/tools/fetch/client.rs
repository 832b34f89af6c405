use crate::error::BackendError;
use reqwest::{redirect, Client};
use std::time::Duration;

const REDIRECT_LIMIT: usize = 10;
const POOL_IDLE_TIMEOUT_SEC: u64 = 90;
const POOL_MAX_IDLE_PER_HOST: usize = 32;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the reqwest client used to talk to the scraping backend.
///
/// Every request goes to the same host, so a single pooled client is shared
/// by all tiers and all concurrent requests.
pub(crate) fn build_backend_client(timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(redirect::Policy::limited(REDIRECT_LIMIT))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SEC))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|e| BackendError::Client(e.to_string()))
}
