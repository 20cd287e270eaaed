//! Catalog HTTP server.
//!
//! Hosts the query tools as an MCP Streamable HTTP endpoint plus a small
//! health route.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/mcp` | MCP JSON-RPC (`initialize`, `tools/list`, `tools/call`, …) |
//! | `GET`  | `/mcp` | MCP server-to-client event stream |
//! | `DELETE` | `/mcp` | End an MCP session |
//! | `GET`  | `/health` | Store connectivity and record count |
//!
//! The MCP path is configurable via `[server].mcp_path`. Sessions are
//! assigned by rmcp's local session manager and identified by the
//! `Mcp-Session-Id` header.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted, and response headers
//! are exposed so browser clients can read `Mcp-Session-Id`.

use axum::{extract::State, routing::get, Json, Router};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use beverage_mcp_core::store::CatalogStore;

use crate::config::Config;
use crate::db;
use crate::mcp::McpBridge;
use crate::migrate;
use crate::sqlite_store::SqliteStore;
use crate::tools::{ToolContext, ToolRegistry};

/// Shared state for the non-MCP routes.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn CatalogStore>,
    mcp_path: Arc<str>,
}

/// Starts the catalog server with the built-in tools.
///
/// Migrates (and, if empty, seeds) the configured database, then serves
/// until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_extensions(config, ToolRegistry::new()).await
}

/// Starts the catalog server with extra tools.
///
/// `extra_tools` are registered after the built-ins; a tool whose name
/// matches a built-in replaces it.
pub async fn run_server_with_extensions(
    config: &Config,
    extra_tools: ToolRegistry,
) -> anyhow::Result<()> {
    let report = migrate::run_migrations(config).await?;
    tracing::info!(
        records = report.total,
        seeded = report.seeded,
        db = %config.db.path.display(),
        "catalog ready"
    );

    let pool = db::connect(&config.db).await?;
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteStore::new(pool));

    let mut tools = ToolRegistry::with_builtins();
    for t in extra_tools.into_tools() {
        tools.register(t);
    }
    for t in tools.tools() {
        tracing::info!(tool = t.name(), "registered tool");
    }

    let app = router(store, Arc::new(tools), &config.server.mcp_path);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        "MCP server listening on http://{}{}",
        listener.local_addr()?,
        config.server.mcp_path
    );
    println!(
        "MCP server listening on http://{}{}",
        config.server.bind, config.server.mcp_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Build the application router.
///
/// Public so tests and embedders can serve it on their own listener.
pub fn router(store: Arc<dyn CatalogStore>, tools: Arc<ToolRegistry>, mcp_path: &str) -> Router {
    let ctx = ToolContext::new(store.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(McpBridge::new(tools.clone(), ctx.clone())),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let state = AppState {
        store,
        mcp_path: Arc::from(mcp_path),
    };

    Router::new()
        .route("/health", get(handle_health))
        .nest_service(mcp_path, mcp_service)
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    /// `"healthy"`, or `"degraded"` when the store cannot be counted.
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    /// `"connected"` or `"unavailable"`.
    database: &'static str,
    beverage_count: Option<i64>,
    mcp_endpoint: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let count = match state.store.count().await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach the catalog store");
            None
        }
    };

    Json(HealthResponse {
        status: if count.is_some() { "healthy" } else { "degraded" },
        service: "beverage-mcp",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: if count.is_some() {
            "connected"
        } else {
            "unavailable"
        },
        beverage_count: count,
        mcp_endpoint: state.mcp_path.to_string(),
    })
}
