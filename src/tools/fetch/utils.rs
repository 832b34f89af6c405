use reqwest::StatusCode;

/// Phrases that mark a nominally successful page as a block or challenge page.
///
/// Plain substring matching: an article that merely mentions "captcha" is
/// rejected too. Replace `blocked_pattern` if that becomes a problem.
pub const BLOCK_PATTERNS: [&str; 5] = [
    "access denied",
    "not allowed",
    "forbidden",
    "cloudflare",
    "captcha",
];

/// First block phrase found in `body`, compared case-insensitively.
pub fn blocked_pattern(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    BLOCK_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lower.contains(pattern))
}

/// Whether `body` looks like an anti-bot or access-denied page.
pub fn body_looks_blocked(body: &str) -> bool {
    blocked_pattern(body).is_some()
}

/// Whether the status code means the backend (or the target) refused the request.
pub fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

/// Validate a backend response.
///
/// Returns Ok(()) if the body is usable, Err(reason) otherwise.
/// Checks for:
/// - Client or server error status codes (>= 400), regardless of body
/// - Block phrases in the body
pub(crate) fn validate_response(status: StatusCode, body: &str) -> Result<(), String> {
    if is_error_status(status) {
        let code = status.as_u16();
        return Err(match status {
            StatusCode::TOO_MANY_REQUESTS => format!("status {code} (rate limited)"),
            StatusCode::FORBIDDEN => format!("status {code} (forbidden)"),
            StatusCode::NOT_FOUND => format!("status {code} (not found)"),
            StatusCode::UNAUTHORIZED => format!("status {code} (unauthorized)"),
            StatusCode::BAD_REQUEST => format!("status {code} (bad request)"),
            _ if status.is_server_error() => format!("status {code} (server error)"),
            _ => format!("status {code} (client error)"),
        });
    }

    if let Some(pattern) = blocked_pattern(body) {
        return Err(format!("blocked - {pattern}"));
    }

    Ok(())
}
