pub mod client;
pub mod config;
pub mod openapi;
pub mod verify;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use crate::client::{ApiClient, ApiResponse, ClientError};
pub use crate::config::{AdapterConfig, BackendConfig, ConfigError, Transport};
pub use crate::openapi::{ApiSpec, HttpMethod, Operation, Parameter, ParamLocation, SpecError};
