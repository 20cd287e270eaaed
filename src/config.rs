//! TOML configuration.
//!
//! One file configures both halves of the system: the catalog server
//! (`[db]`, `[server]`) and the tool-invocation client (`[mcp]`). Every
//! section has defaults, so a client-only config may contain just
//! `[mcp].server_endpoint`.
//!
//! ```toml
//! [db]
//! path = "./data/beverages.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:5062"
//! mcp_path = "/mcp"
//!
//! [mcp]
//! server_endpoint = "http://127.0.0.1:5062/mcp"
//! timeout_secs = 5
//! ```
//!
//! The client endpoint is not validated here. [`CatalogClient::new`](crate::client::CatalogClient::new)
//! checks it when the client is built, so server-only deployments can leave it out.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mcp: McpClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/beverages.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Path the MCP Streamable HTTP endpoint is mounted at.
    #[serde(default = "default_mcp_path")]
    pub mcp_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            mcp_path: default_mcp_path(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5062".to_string()
}
fn default_mcp_path() -> String {
    "/mcp".to_string()
}

/// Settings for the tool-invocation client.
#[derive(Debug, Deserialize, Clone)]
pub struct McpClientConfig {
    /// Full URL of the remote MCP endpoint, e.g. `http://host:5062/mcp`.
    #[serde(default)]
    pub server_endpoint: Option<String>,
    /// Upper bound for one whole invocation (open, call, read).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for McpClientConfig {
    fn default() -> Self {
        Self {
            server_endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

impl McpClientConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            server_endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    let mcp_path = &config.server.mcp_path;
    if !mcp_path.starts_with('/') || mcp_path.len() < 2 || mcp_path.ends_with('/') {
        anyhow::bail!(
            "server.mcp_path must look like '/mcp' (leading '/', no trailing '/'), got '{}'",
            mcp_path
        );
    }

    if config.mcp.timeout_secs == 0 {
        anyhow::bail!("mcp.timeout_secs must be > 0");
    }

    Ok(config)
}
