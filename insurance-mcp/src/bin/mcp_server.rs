//! insurance-mcp - expose the Insurance Management API as MCP tools
//!
//! Loads the API description at startup, builds one tool per operation and
//! forwards each tool call to the configured backend. Serves over stdio by
//! default, or streamable HTTP with `--transport http`.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use insurance_mcp::config::{
    AdapterConfig, BackendConfig, Transport, DEFAULT_API_KEY, DEFAULT_API_KEY_HEADER,
    DEFAULT_BASE_URL, DEFAULT_HTTP_BIND, DEFAULT_SPEC_PATH, SERVER_NAME,
};
use insurance_mcp::mcp::{InsuranceServer, ToolRegistry};
use insurance_mcp::{ApiClient, ApiSpec};
use rmcp::ServiceExt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "insurance-mcp", version, about = "MCP server for the Insurance Management API")]
struct Cli {
    /// OpenAPI document describing the backend (YAML or JSON)
    #[arg(long, env = "INSURANCE_OPENAPI_SPEC", default_value = DEFAULT_SPEC_PATH)]
    spec: PathBuf,

    /// Backend base URL
    #[arg(long, env = "INSURANCE_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key sent on every backend request
    #[arg(long, env = "INSURANCE_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Header that carries the API key
    #[arg(long, env = "INSURANCE_API_KEY_HEADER", default_value = DEFAULT_API_KEY_HEADER)]
    api_key_header: String,

    /// Backend request timeout in seconds
    #[arg(long, env = "INSURANCE_API_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Transport to serve MCP on
    #[arg(long, value_enum, default_value_t = TransportKind::Stdio)]
    transport: TransportKind,

    /// Listen address for the HTTP transport
    #[arg(long, default_value = DEFAULT_HTTP_BIND)]
    bind: SocketAddr,

    /// Serve HTTP without sessions; each request stands alone
    #[arg(long)]
    stateless: bool,

    /// Print the tool catalogue as JSON and exit
    #[arg(long)]
    list_tools: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    Stdio,
    Http,
}

impl Cli {
    fn into_config(self) -> AdapterConfig {
        let transport = match self.transport {
            TransportKind::Stdio => Transport::Stdio,
            TransportKind::Http => Transport::Http {
                bind: self.bind,
                stateless: self.stateless,
            },
        };
        AdapterConfig {
            spec_path: self.spec,
            backend: BackendConfig {
                base_url: self.base_url,
                api_key: self.api_key,
                api_key_header: self.api_key_header,
                timeout: Duration::from_secs(self.timeout_secs),
            },
            transport,
            server_name: SERVER_NAME.to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the MCP channel in stdio mode
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("insurance_mcp=info".parse()?))
        .init();

    let cli = Cli::parse();
    let list_tools = cli.list_tools;
    let config = cli.into_config();
    config.validate().context("invalid configuration")?;

    let spec = ApiSpec::load(&config.spec_path)
        .with_context(|| format!("failed to load API description {}", config.spec_path.display()))?;
    let registry = ToolRegistry::from_spec(&spec);

    if list_tools {
        let json = serde_json::to_string_pretty(&registry.tools())?;
        println!("{json}");
        return Ok(());
    }

    if registry.is_empty() {
        bail!("API description {} defines no operations", config.spec_path.display());
    }

    tracing::info!(
        spec = %config.spec_path.display(),
        base_url = %config.backend.base_url,
        operations = registry.len(),
        "loaded {} {}",
        spec.title,
        spec.version
    );

    let client = ApiClient::new(&config.backend).context("failed to create backend client")?;
    let server = InsuranceServer::new(registry, client).with_name(config.server_name.clone());

    match config.transport {
        Transport::Stdio => {
            tracing::info!("Server ready, listening on stdio");
            let service = server.serve(rmcp::transport::stdio()).await?;
            service.waiting().await?;
        }
        Transport::Http { bind, stateless } => serve_http(server, bind, stateless).await?,
    }

    Ok(())
}

#[cfg(feature = "mcp-http")]
async fn serve_http(server: InsuranceServer, bind: SocketAddr, stateless: bool) -> Result<()> {
    insurance_mcp::mcp::http::serve(server, bind, stateless)
        .await
        .with_context(|| format!("HTTP transport failed on {bind}"))
}

#[cfg(not(feature = "mcp-http"))]
async fn serve_http(_server: InsuranceServer, _bind: SocketAddr, _stateless: bool) -> Result<()> {
    bail!("this build has no HTTP transport; rebuild with the `mcp-http` feature")
}
