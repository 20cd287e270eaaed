//! # Beverage catalog CLI (`bev`)
//!
//! Runs the catalog MCP server and talks to it as a client.
//!
//! ## Usage
//!
//! ```bash
//! bev --config ./config/bev.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bev init` | Create the SQLite catalog and seed it if empty |
//! | `bev serve mcp` | Start the MCP Streamable HTTP server |
//! | `bev tools` | List the query tools the server exposes |
//! | `bev beverages [--search S] [--category C]` | Show a listing through the MCP client |
//! | `bev call <tool> [--arg k=v]...` | Invoke one tool and report failures verbosely |
//!
//! Client commands need `[mcp].server_endpoint` in the config file or
//! `--endpoint` on the command line.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beverage_mcp::client::CatalogClient;
use beverage_mcp::config::{self, Config};
use beverage_mcp::tools::{Tool, ToolArgs, ToolRegistry};
use beverage_mcp::{migrate, render, server};

const DEFAULT_CONFIG: &str = "./config/bev.toml";

/// Beverage catalog over MCP: server and client.
#[derive(Parser)]
#[command(
    name = "bev",
    about = "Beverage catalog served as MCP tools, with a client to query it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/bev.toml` when that file exists, otherwise
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// MCP endpoint URL for client commands; overrides `[mcp].server_endpoint`.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog schema and seed it when empty.
    ///
    /// Safe to run repeatedly.
    Init,

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },

    /// List the query tools and their parameters.
    Tools,

    /// Show beverages through the MCP client.
    ///
    /// A search term takes precedence over a category. With neither,
    /// the whole catalog is listed.
    Beverages {
        /// Name fragment to search for.
        #[arg(long)]
        search: Option<String>,

        /// Category to filter by.
        #[arg(long)]
        category: Option<String>,
    },

    /// Invoke one tool by name and print its decoded result.
    Call {
        /// Tool name, e.g. `filter_by_origin`.
        tool: String,

        /// Tool argument as KEY=VALUE. Typed by the tool's parameter schema;
        /// for unknown tools, integer values are sent as numbers.
        #[arg(long = "arg", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// MCP Streamable HTTP server.
    Mcp,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Build tool arguments from `KEY=VALUE` pairs.
///
/// A key the tool declares as `string` is always sent as a string, so
/// `--arg name=42` searches for "42". Other keys, and keys of tools not
/// known locally, are sent as numbers when they parse as one.
fn to_tool_args(tool: Option<&dyn Tool>, pairs: &[(String, String)]) -> ToolArgs {
    let schema = tool.map(|t| t.parameters_schema());
    pairs
        .iter()
        .map(|(k, v)| {
            let declared = schema
                .as_ref()
                .and_then(|s| s["properties"][k.as_str()]["type"].as_str());
            let value = match declared {
                Some("string") => Value::String(v.clone()),
                _ => v
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(v.clone())),
            };
            (k.clone(), value)
        })
        .collect()
}

fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beverage_mcp=info,bev=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut cfg = resolve_config(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        cfg.mcp.server_endpoint = Some(endpoint);
    }

    match cli.command {
        Commands::Init => {
            let report = migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
            println!("  Path:      {}", cfg.db.path.display());
            println!("  Seeded:    {}", report.seeded);
            println!("  Beverages: {}", report.total);
        }
        Commands::Serve { service } => match service {
            ServeService::Mcp => server::run_server(&cfg).await?,
        },
        Commands::Tools => {
            let registry = ToolRegistry::with_builtins();
            println!("{:<24} {:<24} DESCRIPTION", "TOOL", "PARAMETER");
            for tool in registry.tools() {
                let schema = tool.parameters_schema();
                let param = schema["properties"]
                    .as_object()
                    .and_then(|props| {
                        props.iter().next().map(|(name, prop)| {
                            format!("{}: {}", name, prop["type"].as_str().unwrap_or("any"))
                        })
                    })
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<24} {:<24} {}", tool.name(), param, tool.description());
            }
        }
        Commands::Beverages { search, category } => {
            let client = CatalogClient::new(&cfg.mcp)?;
            let beverages = client
                .beverages(search.as_deref(), category.as_deref())
                .await;
            render::print_table(&beverages);
        }
        Commands::Call { tool, args } => {
            let client = CatalogClient::new(&cfg.mcp)?;
            let registry = ToolRegistry::with_builtins();
            let args = to_tool_args(registry.find(&tool), &args);
            let beverages = client
                .try_invoke(&tool, &args)
                .await
                .with_context(|| format!("{} invocation failed", tool))?;
            render::print_table(&beverages);
        }
    }

    Ok(())
}
