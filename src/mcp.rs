//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] to the MCP `list_tools` / `call_tool`
//! methods so that any MCP client can reach the catalog over Streamable
//! HTTP. Every tool is advertised as read-only.
//!
//! Error mapping:
//!
//! | Registry outcome | MCP response |
//! |------------------|--------------|
//! | unknown tool | JSON-RPC error `METHOD_NOT_FOUND` |
//! | [`ToolError::InvalidArgument`] | JSON-RPC error `INVALID_PARAMS` |
//! | store / serialization failure | result with `isError: true` |

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};

use crate::tools::{self, ToolContext, ToolError, ToolRegistry};

/// Per-session handler. Everything is behind `Arc`, so every MCP session
/// shares one registry and one store.
#[derive(Clone)]
pub struct McpBridge {
    tools: Arc<ToolRegistry>,
    ctx: ToolContext,
}

impl McpBridge {
    pub fn new(tools: Arc<ToolRegistry>, ctx: ToolContext) -> Self {
        Self { tools, ctx }
    }

    /// Convert a catalog tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn tools::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "beverage-mcp".to_string(),
                title: Some("Beverage Catalog".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only beverage catalog. Every tool returns a JSON array of beverage \
                 records as a single text block. Use list_all for everything, or one of the \
                 search_by_name / filter_by_* tools to narrow the list."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request.arguments.unwrap_or_default();
        tracing::debug!(tool = %request.name, args = ?args, "tools/call");

        match self.tools.call(&request.name, &args, &self.ctx).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(ToolError::UnknownTool(name)) => Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", name),
                None,
            )),
            Err(ToolError::InvalidArgument(msg)) => Err(McpError::new(
                ErrorCode::INVALID_PARAMS,
                format!("{}: {}", request.name, msg),
                None,
            )),
            Err(e) => {
                tracing::error!(tool = %request.name, error = %e, "tool execution failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}
