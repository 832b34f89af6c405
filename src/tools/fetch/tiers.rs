//! Escalation Ladder
//!
//! Each rung keeps everything the previous one sends and adds one capability:
//! - `Basic` → markdown output only
//! - `Premium` → + premium proxy routing
//! - `Stealth` → + JavaScript rendering
//! - `Wait` → + fixed wait before capture
use super::types::{FetchOptions, Tier};

/// Fixed wait used by the `Wait` tier.
pub const WAIT_TIER_MS: u64 = 5_000;

const BASIC: FetchOptions = FetchOptions {
    markdown: true,
    premium_proxy: false,
    render_js: false,
    wait_ms: None,
    wait_for: None,
};

const PREMIUM: FetchOptions = FetchOptions {
    markdown: true,
    premium_proxy: true,
    render_js: false,
    wait_ms: None,
    wait_for: None,
};

const STEALTH: FetchOptions = FetchOptions {
    markdown: true,
    premium_proxy: true,
    render_js: true,
    wait_ms: None,
    wait_for: None,
};

const WAIT: FetchOptions = FetchOptions {
    markdown: true,
    premium_proxy: true,
    render_js: true,
    wait_ms: Some(WAIT_TIER_MS),
    wait_for: None,
};

/// Tiers in the order they are attempted. Must stay sorted by cost.
pub static LADDER: [(Tier, FetchOptions); 4] = [
    (Tier::Basic, BASIC),
    (Tier::Premium, PREMIUM),
    (Tier::Stealth, STEALTH),
    (Tier::Wait, WAIT),
];
