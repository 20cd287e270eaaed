//! MCP Streamable HTTP client session.
//!
//! A [`McpSession`] performs the client half of the handshake against a
//! remote endpoint:
//!
//! 1. `POST initialize`, remembering the `Mcp-Session-Id` response header
//!    (a server that assigns none is refused)
//! 2. `POST notifications/initialized`
//! 3. any number of `POST tools/call`
//! 4. `DELETE` with the session header
//!
//! The server may answer a request with a plain `application/json` body or
//! with a `text/event-stream`; for the latter the stream is read until the
//! message answering the request id arrives.
//!
//! A session that is dropped without [`McpSession::close`] (for example
//! because the caller's timeout fired) releases itself in the background.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::InvokeError;
use crate::tools::ToolArgs;

pub const SESSION_HEADER: &str = "mcp-session-id";
pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";
pub const PROTOCOL_VERSION: &str = "2025-03-26";

const ACCEPT_BOTH: &str = "application/json, text/event-stream";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl<'a> JsonRpcRequest<'a> {
    fn call(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method,
            params: Some(params),
        }
    }

    fn notification(method: &'a str) -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            method,
            params: None,
        }
    }
}

/// Result of `tools/call`.
#[derive(Debug, Default, Deserialize)]
pub struct CallToolResponse {
    #[serde(default)]
    pub content: Option<Vec<ContentBlock>>,
    #[serde(default, rename = "isError")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl CallToolResponse {
    /// Text of the first content block, if that block is text.
    pub fn first_text(&self) -> Option<&str> {
        let block = self.content.as_ref()?.first()?;
        if block.kind != "text" {
            return None;
        }
        block.text.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// One message read off the wire, relative to the request being awaited.
#[derive(Debug)]
enum Reply {
    /// The response to our request: its `result`, or the remote error.
    Answer(Result<Value, InvokeError>),
    /// A server request, a notification, or a response to another id.
    Unrelated,
}

fn classify(data: &str, id: u64) -> Result<Reply, InvokeError> {
    let message: Value = serde_json::from_str(data)
        .map_err(|e| InvokeError::MalformedResponse(format!("not a JSON-RPC message: {}", e)))?;

    if !message.is_object() || message.get("method").is_some() {
        return Ok(Reply::Unrelated);
    }
    if message.get("id").and_then(Value::as_u64) != Some(id) {
        return Ok(Reply::Unrelated);
    }

    if let Some(err) = message.get("error") {
        return Ok(Reply::Answer(Err(InvokeError::RemoteInvocation {
            code: err.get("code").and_then(Value::as_i64),
            message: err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        })));
    }

    match message.get("result") {
        Some(result) => Ok(Reply::Answer(Ok(result.clone()))),
        None => Ok(Reply::Answer(Err(InvokeError::MalformedResponse(
            "response has neither result nor error".to_string(),
        )))),
    }
}

/// Read the answer to request `id` from a JSON or SSE response body.
async fn read_reply(resp: Response, id: u64) -> Result<Value, InvokeError> {
    let is_stream = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("text/event-stream"))
        .unwrap_or(false);

    if !is_stream {
        let body = resp.text().await?;
        return match classify(&body, id)? {
            Reply::Answer(outcome) => outcome,
            Reply::Unrelated => Err(InvokeError::MalformedResponse(format!(
                "response does not answer request {}",
                id
            ))),
        };
    }

    let mut events = resp.bytes_stream().eventsource();
    while let Some(event) = events.next().await {
        let event = event.map_err(|e| InvokeError::Connection(e.to_string()))?;
        if event.data.trim().is_empty() {
            continue;
        }
        match classify(&event.data, id)? {
            Reply::Answer(outcome) => return outcome,
            Reply::Unrelated => {
                tracing::trace!(event = %event.event, "skipping unrelated server message");
            }
        }
    }

    Err(InvokeError::MalformedResponse(format!(
        "event stream ended before request {} was answered",
        id
    )))
}

async fn delete_session(
    http: &Client,
    endpoint: &Url,
    session_id: &str,
    protocol_version: &str,
) -> Result<(), reqwest::Error> {
    http.delete(endpoint.clone())
        .header(SESSION_HEADER, session_id)
        .header(PROTOCOL_VERSION_HEADER, protocol_version)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

/// An open MCP session with one remote endpoint.
pub struct McpSession {
    http: Client,
    endpoint: Url,
    session_id: Option<String>,
    protocol_version: String,
    next_id: u64,
}

impl McpSession {
    /// Connect and complete the initialize handshake.
    pub async fn open(http: &Client, endpoint: &Url) -> Result<Self, InvokeError> {
        let mut session = Self {
            http: http.clone(),
            endpoint: endpoint.clone(),
            session_id: None,
            protocol_version: PROTOCOL_VERSION.to_string(),
            next_id: 1,
        };

        let id = session.next_request_id();
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "beverage-mcp",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        let resp = session
            .post(&JsonRpcRequest::call(id, "initialize", params))
            .await?;
        session.session_id = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(str::to_owned);
        if session.session_id.is_none() {
            return Err(InvokeError::Connection(
                "server did not assign a session id".to_string(),
            ));
        }

        let init = read_reply(resp, id).await?;
        if let Some(version) = init.get("protocolVersion").and_then(Value::as_str) {
            session.protocol_version = version.to_string();
        }

        session
            .post(&JsonRpcRequest::notification("notifications/initialized"))
            .await?;

        tracing::debug!(
            endpoint = %session.endpoint,
            session = session.session_id.as_deref().unwrap_or_default(),
            "mcp session opened"
        );
        Ok(session)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Call one tool and return its raw result.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: &ToolArgs,
    ) -> Result<CallToolResponse, InvokeError> {
        let id = self.next_request_id();
        let params = json!({ "name": name, "arguments": arguments });
        let resp = self
            .post(&JsonRpcRequest::call(id, "tools/call", params))
            .await?;
        let result = read_reply(resp, id).await?;
        serde_json::from_value(result)
            .map_err(|e| InvokeError::MalformedResponse(format!("tools/call result: {}", e)))
    }

    /// End the session on the server. Failures are only logged.
    pub async fn close(mut self) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };
        if let Err(e) =
            delete_session(&self.http, &self.endpoint, &session_id, &self.protocol_version).await
        {
            tracing::debug!(session = %session_id, error = %e, "failed to close mcp session");
        }
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    async fn post(&self, body: &JsonRpcRequest<'_>) -> Result<Response, InvokeError> {
        let mut req = self
            .http
            .post(self.endpoint.clone())
            .header(ACCEPT, ACCEPT_BOTH)
            .json(body);
        if let Some(session_id) = &self.session_id {
            req = req
                .header(SESSION_HEADER, session_id)
                .header(PROTOCOL_VERSION_HEADER, &self.protocol_version);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InvokeError::Connection(format!(
                "MCP endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }
        Ok(resp)
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let version = self.protocol_version.clone();
        handle.spawn(async move {
            if let Err(e) = delete_session(&http, &endpoint, &session_id, &version).await {
                tracing::debug!(session = %session_id, error = %e, "failed to release mcp session");
            }
        });
    }
}
