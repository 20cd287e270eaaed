//! Tool-invocation client.
//!
//! [`CatalogClient`] calls a named catalog tool on a remote MCP server and
//! hands back the decoded records. Its contract toward presentation code
//! is simple: every call returns a list, possibly empty. Connection
//! failures, remote errors, and undecodable payloads are logged at `warn`
//! with the tool name, arguments, and an `error_kind` label, then replaced
//! by `[]`. [`CatalogClient::try_invoke`] returns the classified
//! [`InvokeError`] instead, for callers that need to tell the cases apart.
//!
//! Each invocation opens its own MCP session and closes it afterwards,
//! whatever the outcome. The whole exchange is bounded by
//! `[mcp].timeout_secs`.

use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;

use beverage_mcp_core::decode::try_decode_beverages;
use beverage_mcp_core::models::Beverage;

use crate::config::McpClientConfig;
use crate::error::{ConfigurationError, InvokeError};
use crate::tools::{CatalogTool, ToolArgs};
use crate::transport::McpSession;

/// Which listing the presentation layer asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    All,
    Name(String),
    Category(String),
}

impl CatalogQuery {
    /// A non-blank search term wins over a non-blank category; with
    /// neither, everything is listed.
    pub fn select(search: Option<&str>, category: Option<&str>) -> Self {
        if let Some(term) = non_blank(search) {
            return CatalogQuery::Name(term.to_string());
        }
        if let Some(category) = non_blank(category) {
            return CatalogQuery::Category(category.to_string());
        }
        CatalogQuery::All
    }

    pub fn tool(&self) -> CatalogTool {
        match self {
            CatalogQuery::All => CatalogTool::ListAll,
            CatalogQuery::Name(_) => CatalogTool::SearchByName,
            CatalogQuery::Category(_) => CatalogTool::FilterByCategory,
        }
    }

    pub fn arguments(&self) -> ToolArgs {
        let mut args = ToolArgs::new();
        match self {
            CatalogQuery::All => {}
            CatalogQuery::Name(term) => {
                args.insert("name".into(), Value::String(term.clone()));
            }
            CatalogQuery::Category(category) => {
                args.insert("category".into(), Value::String(category.clone()));
            }
        }
        args
    }
}

/// `value` unchanged, unless it is absent or whitespace-only.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn single_arg(key: &str, value: impl Into<Value>) -> ToolArgs {
    let mut args = ToolArgs::new();
    args.insert(key.to_string(), value.into());
    args
}

/// Client for the catalog tools of one MCP endpoint.
#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    endpoint: Url,
    timeout: Duration,
}

impl CatalogClient {
    /// Validate the configuration and build the client.
    ///
    /// Fails when the endpoint is absent, blank, or not an http(s) URL.
    pub fn new(config: &McpClientConfig) -> Result<Self, ConfigurationError> {
        let raw = non_blank(config.server_endpoint.as_deref())
            .map(str::trim)
            .ok_or(ConfigurationError::MissingEndpoint)?;

        let endpoint = Url::parse(raw).map_err(|e| ConfigurationError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidEndpoint {
                endpoint: raw.to_string(),
                reason: format!("unsupported scheme '{}', expected http or https", endpoint.scheme()),
            });
        }

        if config.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidTimeout);
        }
        let timeout = config.timeout();

        let http = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Invoke `tool` and decode its result, reporting why it failed.
    ///
    /// A result without content, or whose first block carries no text, is
    /// an empty list rather than an error.
    pub async fn try_invoke(
        &self,
        tool: &str,
        args: &ToolArgs,
    ) -> Result<Vec<Beverage>, InvokeError> {
        let exchange = async {
            let mut session = McpSession::open(&self.http, &self.endpoint).await?;
            let outcome = session.call_tool(tool, args).await;
            session.close().await;
            outcome
        };

        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                InvokeError::Connection(format!("timed out after {}s", self.timeout.as_secs()))
            })??;

        if response.is_error() {
            return Err(InvokeError::RemoteInvocation {
                code: None,
                message: response
                    .first_text()
                    .unwrap_or("tool reported an error")
                    .to_string(),
            });
        }

        match response.first_text() {
            Some(text) if !text.trim().is_empty() => Ok(try_decode_beverages(text)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Invoke `tool`; any failure is logged and yields `[]`.
    pub async fn invoke(&self, tool: &str, args: &ToolArgs) -> Vec<Beverage> {
        match self.try_invoke(tool, args).await {
            Ok(records) => {
                if records.is_empty() {
                    tracing::debug!(tool, args = ?args, "tool returned no beverages");
                }
                records
            }
            Err(e) => {
                tracing::warn!(
                    tool,
                    args = ?args,
                    error_kind = e.kind(),
                    error = %e,
                    "tool invocation failed, returning no beverages"
                );
                Vec::new()
            }
        }
    }

    async fn invoke_tool(&self, tool: CatalogTool, args: &ToolArgs) -> Vec<Beverage> {
        self.invoke(tool.tool_name(), args).await
    }

    /// Every beverage, ordered by id.
    pub async fn get_all(&self) -> Vec<Beverage> {
        self.invoke_tool(CatalogTool::ListAll, &ToolArgs::new()).await
    }

    /// Beverages whose name contains `term`; a blank term lists everything.
    pub async fn search_by_name(&self, term: &str) -> Vec<Beverage> {
        match non_blank(Some(term)) {
            Some(term) => {
                self.invoke_tool(CatalogTool::SearchByName, &single_arg("name", term))
                    .await
            }
            None => self.get_all().await,
        }
    }

    /// Beverages in `category`; a blank category lists everything.
    pub async fn filter_by_category(&self, category: &str) -> Vec<Beverage> {
        match non_blank(Some(category)) {
            Some(category) => {
                self.invoke_tool(
                    CatalogTool::FilterByCategory,
                    &single_arg("category", category),
                )
                .await
            }
            None => self.get_all().await,
        }
    }

    /// The listing shown to users: search term first, then category, else all.
    pub async fn beverages(&self, search: Option<&str>, category: Option<&str>) -> Vec<Beverage> {
        let query = CatalogQuery::select(search, category);
        self.invoke_tool(query.tool(), &query.arguments()).await
    }

    pub async fn get_by_id(&self, id: i64) -> Option<Beverage> {
        self.invoke_tool(CatalogTool::GetById, &single_arg("id", id))
            .await
            .into_iter()
            .next()
    }

    pub async fn filter_by_ingredient(&self, ingredient: &str) -> Vec<Beverage> {
        self.invoke_tool(
            CatalogTool::FilterByIngredient,
            &single_arg("ingredient", ingredient),
        )
        .await
    }

    pub async fn filter_by_max_calories(&self, max_calories: i64) -> Vec<Beverage> {
        self.invoke_tool(
            CatalogTool::FilterByMaxCalories,
            &single_arg("maxCalories", max_calories),
        )
        .await
    }

    pub async fn filter_by_origin(&self, origin: &str) -> Vec<Beverage> {
        self.invoke_tool(CatalogTool::FilterByOrigin, &single_arg("origin", origin))
            .await
    }
}
