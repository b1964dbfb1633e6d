//! JSON-RPC error envelopes synthesized by the bridge.
//!
//! Every failure path of a relay invocation ends in exactly one
//! [`ErrorEnvelope`] written to stderr. The codes follow the JSON-RPC 2.0
//! reserved range.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol marker carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes the bridge can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// `-32700`: the request argument is not well-formed JSON.
    ParseError,
    /// `-32600`: no request argument was supplied.
    InvalidRequest,
    /// `-32000`: the server process failed, could not start, or timed out.
    ServerError,
}

impl ErrorCode {
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::ServerError => -32000,
        }
    }
}

/// The `error` member of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// A complete JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub jsonrpc: String,
    /// Identifier of the originating request, `null` when unavailable.
    pub id: Value,
    pub error: RpcError,
}

impl ErrorEnvelope {
    pub fn new(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: RpcError {
                code: code.code(),
                message: message.into(),
            },
        }
    }

    /// No request argument was given.
    pub fn missing_request() -> Self {
        Self::new(
            Value::Null,
            ErrorCode::InvalidRequest,
            "Invalid Request: No request provided",
        )
    }

    /// The request argument failed to decode. The id is always `null`
    /// because nothing could be extracted from the payload.
    pub fn parse_error(detail: impl fmt::Display) -> Self {
        Self::new(
            Value::Null,
            ErrorCode::ParseError,
            format!("Parse error: {detail}"),
        )
    }

    /// The server process exited unsuccessfully.
    ///
    /// `code` is `None` when the process was terminated by a signal; it is
    /// rendered as `null`.
    pub fn process_exited(id: Value, code: Option<i32>) -> Self {
        let status = code.map_or_else(|| "null".to_string(), |c| c.to_string());
        Self::new(
            id,
            ErrorCode::ServerError,
            format!("Server error: Process exited with code {status}"),
        )
    }

    /// The server process outlived the deadline.
    pub fn timeout(id: Value) -> Self {
        Self::new(id, ErrorCode::ServerError, "Timeout: Request took too long")
    }

    /// Any other server-side failure (spawn, pipe, wait).
    pub fn server_error(id: Value, detail: impl fmt::Display) -> Self {
        Self::new(id, ErrorCode::ServerError, format!("Server error: {detail}"))
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&line)
    }
}
