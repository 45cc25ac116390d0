//! MCP adapter over the insurance backend.

#[cfg(feature = "mcp-http")]
pub mod http;
mod server;
pub mod tools;

pub use server::InsuranceServer;
pub use tools::{ToolEntry, ToolRegistry};
