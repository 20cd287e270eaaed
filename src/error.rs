//! Error types for the tool-invocation client.
//!
//! [`ConfigurationError`] is the only error a caller ever has to handle:
//! it is returned when a [`CatalogClient`](crate::client::CatalogClient) is
//! built from a bad configuration. Every [`InvokeError`] is absorbed by
//! [`CatalogClient::invoke`](crate::client::CatalogClient::invoke), logged,
//! and replaced by an empty list.

use thiserror::Error;

pub use beverage_mcp_core::decode::DecodeError;

/// The client cannot be built. This is a deployment defect, not a runtime condition.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("MCP server endpoint not configured (set [mcp].server_endpoint)")]
    MissingEndpoint,

    #[error("invalid MCP server endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("MCP client timeout must be at least one second")]
    InvalidTimeout,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Why one tool invocation produced no records.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The endpoint could not be reached, refused the session, or timed out.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected the call: unknown tool, bad argument, or a tool failure.
    #[error("remote invocation error: {message}")]
    RemoteInvocation { code: Option<i64>, message: String },

    /// The server answered, but not with a well-formed JSON-RPC response.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The tool's text payload is not a JSON array of records.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl InvokeError {
    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InvokeError::Connection(_) => "connection",
            InvokeError::RemoteInvocation { .. } => "remote_invocation",
            InvokeError::MalformedResponse(_) => "malformed_response",
            InvokeError::Decode(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for InvokeError {
    fn from(err: reqwest::Error) -> Self {
        InvokeError::Connection(err.to_string())
    }
}
