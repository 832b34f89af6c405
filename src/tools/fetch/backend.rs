//! Scraping backend transport.
//!
//! Whatever the backend returns is normalized to [`BackendResponse`] right
//! here, so the ladder only ever sees a status and a body.

use super::client::build_backend_client;
use super::types::FetchOptions;
use crate::config::Config;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Normalized backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: String,
}

/// One outbound fetch through a scraping service.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &str, options: &FetchOptions)
        -> Result<BackendResponse, BackendError>;
}

/// ScrapingBee-compatible HTTP API.
pub struct ScrapingBeeBackend {
    client: Client,
    api_key: String,
    base_url: Url,
    timeout: Duration,
}

impl ScrapingBeeBackend {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_backend_client(config.timeout)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    /// Query string for one call, api key first.
    pub(crate) fn query_params(&self, url: &str, options: &FetchOptions) -> Vec<(&'static str, String)> {
        let mut params = vec![("api_key", self.api_key.clone()), ("url", url.to_string())];
        params.extend(backend_params(options));
        params
    }
}

/// Map options onto the backend's query parameters.
///
/// `render_js` is always sent because the backend renders by default.
pub(crate) fn backend_params(options: &FetchOptions) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if options.markdown {
        params.push(("markdown_response", "true".to_string()));
    }
    if options.premium_proxy {
        params.push(("premium_proxy", "true".to_string()));
    }
    params.push(("render_js", options.render_js.to_string()));
    if let Some(wait_ms) = options.wait_ms {
        params.push(("wait", wait_ms.to_string()));
    }
    if let Some(selector) = &options.wait_for {
        params.push(("wait_for", selector.clone()));
    }
    params
}

/// Whether a Content-Type header describes something we can return as text.
pub(crate) fn is_textual(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty()
        || mime.starts_with("text/")
        || mime.ends_with("+xml")
        || mime.ends_with("+json")
        || matches!(
            mime.as_str(),
            "application/json" | "application/xml" | "application/javascript"
        )
}

#[async_trait]
impl Backend for ScrapingBeeBackend {
    fn name(&self) -> &'static str {
        "scrapingbee"
    }

    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<BackendResponse, BackendError> {
        let response = self
            .client
            .get(self.base_url.clone())
            .query(&self.query_params(url, options))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout)
                } else {
                    // Strip the query string: it carries the api key.
                    BackendError::Network(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !is_textual(content_type.as_deref()) {
            return Err(BackendError::Body(format!(
                "non-text content type {}",
                content_type.unwrap_or_default()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Body(e.without_url().to_string()))?;

        Ok(BackendResponse { status, body })
    }
}
