use serde::{Deserialize, Serialize};
use std::fmt;

/// Cost level of a fetch strategy.
///
/// Variants are declared in ascending cost order, so the derived `Ord`
/// matches the order the ladder walks them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Plain backend fetch, markdown output.
    Basic,

    /// Routed through the backend's premium proxy pool.
    Premium,

    /// Premium routing plus headless browser rendering.
    Stealth,

    /// Stealth plus a fixed wait before the page is captured.
    Wait,
}

impl Tier {
    /// All tiers, cheapest first.
    pub const ALL: [Tier; 4] = [Tier::Basic, Tier::Premium, Tier::Stealth, Tier::Wait];

    /// Tier Name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Stealth => "stealth",
            Self::Wait => "wait",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend options for a single fetch.
///
/// Field names describe the capability, not the backend's query parameter;
/// the transport maps them (see `backend.rs`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Ask the backend to convert the page to markdown.
    pub markdown: bool,
    /// Use premium (residential) proxy routing.
    pub premium_proxy: bool,
    /// Execute JavaScript in a headless browser.
    pub render_js: bool,
    /// Fixed wait before capture, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_ms: Option<u64>,
    /// CSS selector to wait for before capture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<String>,
}

impl FetchOptions {
    /// Options actually sent for this tier when the caller supplied `selector`.
    ///
    /// The tier's own settings are kept as-is; a selector only adds
    /// `wait_for` and forces `render_js` on.
    pub fn with_selector(&self, selector: Option<&str>) -> FetchOptions {
        let mut options = self.clone();
        if let Some(selector) = selector {
            options.wait_for = Some(selector.to_string());
            options.render_js = true;
        }
        options
    }
}

/// Caller request: a URL and an optional selector to wait for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// The selector, if one was given and it is not blank.
    pub fn selector(&self) -> Option<&str> {
        self.selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Why a single tier attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFailure {
    pub tier: Tier,
    pub reason: String,
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tier, self.reason)
    }
}

/// Result of a successful ladder run.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use tierfetch::tools::fetch::{FetchRequest, Ladder, ScrapingBeeBackend};
/// use tierfetch::Config;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::from_env()?;
/// let ladder = Ladder::new(Arc::new(ScrapingBeeBackend::new(&config)?));
/// let result = ladder.fetch(&FetchRequest::new("https://example.com")).await?;
/// println!("{} after {} attempt(s) in {}ms", result.tier, result.attempts, result.duration_ms);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    /// Page text as returned by the backend
    pub body: String,
    /// The tier that produced the body
    pub tier: Tier,
    /// Number of tiers attempted, including the successful one
    pub attempts: usize,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Cheaper tiers that were tried and rejected, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TierFailure>,
}
