//! # Beverage MCP
//!
//! A read-only beverage catalog published as MCP tools, and a client that
//! consumes those tools on behalf of a presentation layer.
//!
//! The server side keeps the catalog in SQLite and exposes one tool per
//! query predicate over MCP Streamable HTTP. The client side opens a
//! session per call, invokes a named tool, and decodes the JSON text
//! payload into [`Beverage`] records. Toward its callers the client never
//! fails: any problem is logged and becomes an empty list.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  tools/call  ┌────────────┐   ┌──────────┐
//! │ CatalogCli-│─────────────▶│ MCP server │──▶│  SQLite  │
//! │ ent (bev)  │◀─────────────│  (axum)    │   │ catalog  │
//! └────────────┘  JSON text   └────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! bev init                                  # create and seed the catalog
//! bev serve mcp                             # start the MCP server
//! bev --endpoint http://127.0.0.1:5062/mcp beverages --search latte
//! bev --endpoint http://127.0.0.1:5062/mcp call filter_by_max_calories --arg maxCalories=50
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migration and seed data |
//! | [`sqlite_store`] | SQLite-backed catalog store |
//! | [`tools`] | Query tool registry |
//! | [`mcp`] | MCP protocol bridge for the registry |
//! | [`server`] | HTTP server (MCP endpoint + health) |
//! | [`transport`] | Client-side MCP session over HTTP |
//! | [`client`] | Tool-invocation client and selection policy |
//! | [`error`] | Client error taxonomy |
//! | [`render`] | CLI table output |

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod migrate;
pub mod render;
pub mod server;
pub mod sqlite_store;
pub mod tools;
pub mod transport;

pub use beverage_mcp_core::decode::{decode_beverages, try_decode_beverages};
pub use beverage_mcp_core::models::{Beverage, BeverageDraft};
pub use beverage_mcp_core::store::{BeverageFilter, CatalogStore};
pub use client::{CatalogClient, CatalogQuery};
pub use error::{ConfigurationError, InvokeError};
