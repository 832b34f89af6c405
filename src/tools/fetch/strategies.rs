use super::backend::Backend;
use super::tiers::LADDER;
use super::types::*;
use super::utils::validate_response;
use crate::error::FetchError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Escalating fetcher: Basic → Premium → Stealth → Wait.
///
/// Holds no per-request state; share it behind an `Arc` across concurrent
/// requests.
pub struct Ladder {
    backend: Arc<dyn Backend>,
    attempt_timeout: Duration,
}

impl Ladder {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Bound each tier attempt. An attempt that runs over counts as a failed tier.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Walk the ladder until a tier returns a usable page.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        self.fetch_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`Ladder::fetch`], but stops without trying further tiers once
    /// `cancel` fires.
    pub async fn fetch_with_cancel(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        let selector = request.selector();
        let mut failures: Vec<TierFailure> = Vec::new();

        for (idx, (tier, base)) in LADDER.iter().enumerate() {
            let tier = *tier;
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled { tier });
            }

            let options = base.with_selector(selector);
            debug!(url = %request.url, %tier, ?options, "attempting tier");

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled { tier }),
                attempt = self.attempt(&request.url, &options) => attempt,
            };

            match attempt {
                Ok(body) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    info!(url = %request.url, %tier, attempts = idx + 1, duration_ms, "fetched");
                    return Ok(FetchResult {
                        body,
                        tier,
                        attempts: idx + 1,
                        duration_ms,
                        failures,
                    });
                }
                Err(reason) => {
                    warn!(url = %request.url, %tier, %reason, "tier failed, escalating");
                    failures.push(TierFailure { tier, reason });
                }
            }
        }

        let (tier, last_error) = match failures.last() {
            Some(last) => (last.tier, last.reason.clone()),
            None => (Tier::Basic, "no tiers configured".to_string()),
        };
        Err(FetchError::Exhausted {
            tier,
            last_error,
            failures,
        })
    }

    /// One backend call, judged usable or not.
    async fn attempt(&self, url: &str, options: &FetchOptions) -> Result<String, String> {
        let response =
            match tokio::time::timeout(self.attempt_timeout, self.backend.fetch(url, options))
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => return Err(e.to_string()),
                Err(_) => {
                    return Err(format!(
                        "timed out after {}ms",
                        self.attempt_timeout.as_millis()
                    ))
                }
            };

        validate_response(response.status, &response.body)?;
        Ok(response.body)
    }
}
