//! CLI for the fetch tool.
use crate::config::Config;
use crate::tools::fetch::{ladder_from_config, FetchRequest};
use crate::types::ApiResponse;
use clap::Args;
use url::Url;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL to fetch
    pub url: String,

    /// CSS selector to wait for (forces JavaScript rendering)
    #[arg(long, short)]
    pub selector: Option<String>,

    /// Print a JSON envelope with tier metadata instead of the raw body
    #[arg(long)]
    pub json: bool,
}

// Exposed function for delegation from unified CLI.
// Returns whether the fetch succeeded.

pub async fn run_with_args(config: &Config, args: FetchArgs) -> anyhow::Result<bool> {
    // Validate URL
    if let Err(e) = Url::parse(&args.url) {
        eprintln!("Error: invalid URL {}: {}", args.url, e);
        return Ok(false);
    }

    let ladder = ladder_from_config(config)?;
    let mut request = FetchRequest::new(args.url);
    request.selector = args.selector;

    eprintln!("Fetching {}...", request.url);

    match ladder.fetch(&request).await {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&ApiResponse::ok(&result))?);
            } else {
                println!("{}", result.body);
            }
            eprintln!("✓ Fetched with tier {} ({} attempt(s))", result.tier, result.attempts);
            Ok(true)
        }
        Err(e) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string()))?
                );
            }
            eprintln!("Error: {}", e);
            Ok(false)
        }
    }
}
