//! Maps `tools/call` requests onto the fetch ladder.

use super::protocol::{ToolCallParams, ToolCallResult, ToolDefinition};
use crate::tools::fetch::{FetchRequest, Ladder};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub const FETCH_TOOL: &str = "fetch_page";

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: FETCH_TOOL.to_string(),
        description: "Fetch a web page as markdown through a scraping backend. Starts with the \
                      cheapest fetch tier and escalates (basic, premium, stealth, wait) until the \
                      page is not blocked. Supply a CSS selector to wait for content rendered by \
                      JavaScript."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute URL of the page to fetch"
                },
                "selector": {
                    "type": "string",
                    "description": "Optional CSS selector to wait for before capturing the page"
                }
            },
            "required": ["url"]
        }),
    }]
}

/// Run one tool call. Never fails: every problem becomes an error-flagged result.
pub async fn handle_tool_call(
    ladder: &Ladder,
    params: ToolCallParams,
    cancel: &CancellationToken,
) -> ToolCallResult {
    if params.name != FETCH_TOOL {
        return ToolCallResult::error(format!("unknown tool: {}", params.name));
    }

    let request: FetchRequest = match serde_json::from_value(params.arguments) {
        Ok(request) => request,
        Err(e) => return ToolCallResult::error(format!("invalid arguments: {e}")),
    };
    if request.url.trim().is_empty() {
        return ToolCallResult::error("invalid arguments: url must not be empty");
    }

    match ladder.fetch_with_cancel(&request, cancel).await {
        Ok(result) => {
            let meta = json!({
                "tier": result.tier,
                "attempts": result.attempts,
                "duration_ms": result.duration_ms,
            });
            ToolCallResult::text(result.body).with_meta(meta)
        }
        Err(e) => {
            warn!(url = %request.url, error = %e, "fetch failed");
            ToolCallResult::error(format!("fetch failed: {e}"))
        }
    }
}
