//! insurance-verify - end-to-end checklist against a running Insurance API
//!
//! Exits 0 when every check passed, 1 on any failed check, an unreachable
//! backend or an aborted run.

use anyhow::{Context, Result};
use clap::Parser;
use insurance_mcp::config::DEFAULT_API_KEY;
use insurance_mcp::verify::{run_all, BackendClient, Reporter, DEFAULT_BASE_URL};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "insurance-verify", version, about = "Verify a running Insurance API end to end")]
struct Cli {
    /// Base URL of the backend under test
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key for authenticated requests
    #[arg(long, env = "API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Give up on any single request after this many seconds (no limit by default)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Disable ANSI colours (also honoured via NO_COLOR)
    #[arg(long)]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insurance_mcp=warn"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    let color = !cli.no_color && !no_color_env && io::stdout().is_terminal();

    let client = match cli.timeout_secs {
        Some(secs) => BackendClient::with_timeout(&cli.base_url, &cli.api_key, Duration::from_secs(secs)),
        None => BackendClient::new(&cli.base_url, &cli.api_key),
    }
    .with_context(|| format!("failed to set up a client for {}", cli.base_url))?;

    let mut reporter = Reporter::new(io::stdout().lock(), color);
    let outcome = run_all(&client, &mut reporter).await;
    Ok(ExitCode::from(outcome.exit_code()))
}
