//! The request payload relayed to the server process.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

use crate::envelope::JSONRPC_VERSION;
use crate::error::Result;

/// A JSON-RPC request, held as an opaque JSON value.
///
/// Only `id` and `method` are ever read; everything else passes through
/// untouched, with object key order preserved. The binary decodes requests
/// with [`RpcRequest::parse`]; programs embedding the bridge build them with
/// [`RpcRequest::call`] and hand them to the relay directly.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest(Value);

impl RpcRequest {
    /// Decode a request from caller-supplied text.
    pub fn parse(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self)
    }

    /// Build a method call with a millisecond-timestamp id.
    pub fn call(method: &str, params: Value) -> Self {
        let id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        Self(json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": method,
            "params": params,
        }))
    }

    /// The request identifier, or `null` when absent or the payload is not
    /// an object.
    pub fn id(&self) -> Value {
        self.0.get("id").cloned().unwrap_or(Value::Null)
    }

    pub fn method(&self) -> Option<&str> {
        self.0.get("method").and_then(Value::as_str)
    }

    /// Serialize to a single newline-terminated line for the server's stdin.
    pub fn to_wire(&self) -> Result<String> {
        let mut line = serde_json::to_string(&self.0)?;
        line.push('\n');
        Ok(line)
    }
}
