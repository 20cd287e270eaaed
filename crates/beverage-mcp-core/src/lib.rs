//! # beverage-mcp core
//!
//! Transport-free logic shared by the beverage catalog server and client:
//! the [`models::Beverage`] record, the [`store::CatalogStore`] abstraction
//! with its in-memory backend, and the tolerant [`decode`] view mapper.
//!
//! This crate contains no tokio, sqlx, or HTTP dependencies.

pub mod decode;
pub mod models;
pub mod store;
