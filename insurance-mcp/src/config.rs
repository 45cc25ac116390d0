//! Adapter configuration.
//!
//! The binary fills these from CLI flags and environment variables; the library
//! only validates them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://insurance-api-demo.vercel.app";
pub const DEFAULT_API_KEY: &str = "demo-key-12345";
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SPEC_PATH: &str = "openapi.yaml";
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8000";
pub const SERVER_NAME: &str = "Insurance Management API";
pub const SERVER_TAGS: &[&str] = &["insurance", "api", "management"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    EmptyApiKey,
    #[error("API key header name must not be empty")]
    EmptyApiKeyHeader,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    #[error("invalid backend base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Where and how outbound requests are sent.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_key_header: String,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BackendConfig {
    /// Parse the base URL, rejecting anything that is not http(s).
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme {other}"))),
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".into()));
        }
        Ok(url)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        if self.api_key_header.trim().is_empty() {
            return Err(ConfigError::EmptyApiKeyHeader);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.parsed_base_url().map(|_| ())
    }
}

/// Inbound transport the adapter serves MCP on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout.
    Stdio,
    /// Streamable HTTP. `stateless` disables sessions so every POST stands alone.
    Http { bind: SocketAddr, stateless: bool },
}

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub spec_path: PathBuf,
    pub backend: BackendConfig,
    pub transport: Transport,
    pub server_name: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            spec_path: PathBuf::from(DEFAULT_SPEC_PATH),
            backend: BackendConfig::default(),
            transport: Transport::Stdio,
            server_name: SERVER_NAME.to_string(),
        }
    }
}

impl AdapterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend.validate()
    }
}
