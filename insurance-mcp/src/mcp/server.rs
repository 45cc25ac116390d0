use crate::client::{ApiClient, ClientError};
use crate::config::{SERVER_NAME, SERVER_TAGS};
use crate::mcp::tools::ToolRegistry;
use rmcp::model::{ErrorData as McpError, *};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use std::sync::Arc;

/// MCP server exposing every backend operation as a tool.
///
/// Clones share the read-only registry and the pooled HTTP client. Each tool
/// call is one outbound request; nothing is cached between calls.
#[derive(Clone)]
pub struct InsuranceServer {
    registry: Arc<ToolRegistry>,
    client: ApiClient,
    name: String,
}

impl InsuranceServer {
    pub fn new(registry: ToolRegistry, client: ApiClient) -> Self {
        Self {
            registry: Arc::new(registry),
            client,
            name: SERVER_NAME.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one tool call against the backend.
    ///
    /// Backend failures come back as a tool result with `is_error` set so the
    /// calling agent can read the message. Only problems with the call itself
    /// (unknown tool, missing arguments) are protocol errors.
    ///
    /// # Errors
    ///
    /// `invalid_params` for an unknown tool or a missing required parameter,
    /// `internal_error` when the client cannot be used at all.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown tool: {name}"), None))?;
        let op = &entry.operation;
        let args = arguments.unwrap_or_default();

        tracing::debug!(tool = name, method = %op.method, path = %op.path, "calling backend");

        match self.client.execute(op, &args).await {
            Ok(response) => {
                let text = serde_json::to_string_pretty(&response.body)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(ClientError::MissingParameter(param)) => Err(McpError::invalid_params(
                format!("missing required parameter: {param}"),
                None,
            )),
            Err(err @ (ClientError::Status { .. } | ClientError::Transport(_))) => {
                tracing::warn!(tool = name, error = %err, "backend call failed");
                Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
            }
            Err(err) => Err(McpError::internal_error(err.to_string(), None)),
        }
    }
}

impl ServerHandler for InsuranceServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(format!(
                "Tools for the Insurance Management API ({} operations): policies, claims, \
                 risk assessment, customers, quotes, payments and related records. \
                 Tags: {}.",
                self.registry.len(),
                SERVER_TAGS.join(", ")
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.registry.tools(),
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.invoke(&request.name, request.arguments).await
    }
}
