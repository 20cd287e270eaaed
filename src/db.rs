//! SQLite connection management for the catalog store.
//!
//! The catalog is read by every MCP session concurrently and written only
//! by `bev init`, so the pool runs in WAL mode. The database file and its
//! parent directories are created on first connect.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::DbConfig;

/// Pool size shared by all sessions of one server process.
const MAX_CONNECTIONS: u32 = 5;

/// Open a pool on the database at `db.path`.
pub async fn connect(db: &DbConfig) -> Result<SqlitePool> {
    if let Some(parent) = db.path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open catalog database: {}", db.path.display()))?;

    Ok(pool)
}
