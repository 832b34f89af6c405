use crate::config::Config;
use crate::server::Server;
use crate::tools::fetch::{self, cli::FetchArgs};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(
    name = "tierfetch",
    version,
    about = "Fetch pages through a scraping backend, escalating tiers until one gets through"
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Fetch a single URL and print it
    Fetch(FetchArgs),
}

/// Exit status when the configuration can't be loaded.
pub(crate) const EXIT_CONFIG: u8 = 1;

pub fn run() -> anyhow::Result<ExitCode> {
    crate::services::init_logging();
    let cli = Cli::parse();

    let config = match load_startup_config(|name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(code) => return Ok(ExitCode::from(code)),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    match cli.cmd.unwrap_or(Command::Serve) {
        Command::Serve => {
            let ladder = fetch::ladder_from_config(&config)?;
            let server = Server::new(ladder);
            runtime.block_on(server.run_stdio())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Fetch(args) => {
            let ok = runtime.block_on(fetch::cli::run_with_args(&config, args))?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

/// Missing credentials are the one fatal error: fail before serving anything.
fn load_startup_config<F>(lookup: F) -> Result<Config, u8>
where
    F: Fn(&str) -> Option<String>,
{
    Config::from_lookup(lookup).map_err(|e| {
        error!("{e}");
        EXIT_CONFIG
    })
}
