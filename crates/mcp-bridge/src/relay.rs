//! The relay: validate one request, run one exchange, produce one outcome.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use mcp_bridge_core::{Config, ErrorEnvelope, RelayResponse, RpcRequest};

use crate::subprocess::{ExchangeOutcome, ServerProcess, SpawnConfig};

/// Final result of a relay invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Written to stdout, exit code 0.
    Response(RelayResponse),
    /// Written to stderr, exit code 1.
    Failed(ErrorEnvelope),
}

impl Outcome {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Response(_) => 0,
            Self::Failed(_) => 1,
        }
    }

    /// Write the outcome to the stream it belongs on.
    pub async fn emit<O, E>(&self, stdout: &mut O, stderr: &mut E) -> std::io::Result<()>
    where
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        match self {
            Self::Response(response) => {
                let bytes = response.to_bytes().map_err(std::io::Error::other)?;
                stdout.write_all(&bytes).await?;
                stdout.flush().await
            }
            Self::Failed(envelope) => {
                stderr.write_all(format!("{envelope}\n").as_bytes()).await?;
                stderr.flush().await
            }
        }
    }
}

/// Relays requests to one configured MCP server.
#[derive(Debug, Clone)]
pub struct Relay {
    process: ServerProcess,
}

impl Relay {
    pub const fn new(config: SpawnConfig) -> Self {
        Self {
            process: ServerProcess::new(config),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(SpawnConfig::from(config))
    }

    /// Run one invocation.
    ///
    /// `arg` is the raw request argument; `None` or an empty string count as
    /// no request. No process is spawned unless the argument parses. Server
    /// stderr is forwarded to `stderr_sink` while the exchange runs.
    pub async fn run<W>(&self, arg: Option<&str>, stderr_sink: W) -> Outcome
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Some(payload) = arg.filter(|a| !a.is_empty()) else {
            debug!("No request argument supplied");
            return Outcome::Failed(ErrorEnvelope::missing_request());
        };

        let request = match RpcRequest::parse(payload) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Request argument is not valid JSON");
                return Outcome::Failed(ErrorEnvelope::parse_error(e));
            }
        };
        self.send(&request, stderr_sink).await
    }

    /// Relay an already-decoded request.
    ///
    /// Embedders that build requests with [`RpcRequest::call`] enter here
    /// instead of going through [`Self::run`].
    pub async fn send<W>(&self, request: &RpcRequest, stderr_sink: W) -> Outcome
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let id = request.id();
        info!(id = %id, method = ?request.method(), "Relaying request");

        let wire = match request.to_wire() {
            Ok(wire) => wire,
            Err(e) => return Outcome::Failed(ErrorEnvelope::server_error(id, e)),
        };

        match self.process.exchange(wire, stderr_sink).await {
            Ok(ExchangeOutcome::Exited {
                success: true,
                stdout,
                ..
            }) => Outcome::Response(RelayResponse::from_output(stdout)),
            Ok(ExchangeOutcome::Exited { code, .. }) => {
                info!(id = %id, ?code, "Server process failed");
                Outcome::Failed(ErrorEnvelope::process_exited(id, code))
            }
            Ok(ExchangeOutcome::TimedOut) => {
                info!(
                    id = %id,
                    timeout_secs = self.process.config().timeout.as_secs_f64(),
                    "Request timed out"
                );
                Outcome::Failed(ErrorEnvelope::timeout(id))
            }
            Err(e) => {
                info!(id = %id, error = %e, "Exchange with server failed");
                Outcome::Failed(ErrorEnvelope::server_error(id, e))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use mcp_bridge_core::ErrorCode;
    use serde_json::{Value, json};

    /// A relay whose server cannot exist; any test reaching spawn fails loudly.
    fn unreachable_relay() -> Relay {
        Relay::new(SpawnConfig {
            program: PathBuf::from("/nonexistent/never-spawned"),
            timeout: Duration::from_secs(1),
        })
    }

    fn envelope(outcome: Outcome) -> ErrorEnvelope {
        match outcome {
            Outcome::Failed(envelope) => envelope,
            Outcome::Response(r) => panic!("expected failure, got {r:?}"),
        }
    }

    #[tokio::test]
    async fn missing_argument_is_invalid_request() {
        let outcome = unreachable_relay().run(None, tokio::io::sink()).await;
        assert_eq!(outcome.exit_code(), 1);
        let env = envelope(outcome);
        assert_eq!(env.error.code, ErrorCode::InvalidRequest.code());
        assert_eq!(env.id, Value::Null);
    }

    #[tokio::test]
    async fn empty_argument_is_invalid_request() {
        let env = envelope(unreachable_relay().run(Some(""), tokio::io::sink()).await);
        assert_eq!(env.error.code, ErrorCode::InvalidRequest.code());
    }

    #[tokio::test]
    async fn malformed_argument_is_parse_error() {
        let outcome = unreachable_relay()
            .run(Some(r#"{"id": 3,"#), tokio::io::sink())
            .await;
        let env = envelope(outcome);
        assert_eq!(env.error.code, ErrorCode::ParseError.code());
        assert!(env.error.message.starts_with("Parse error: "));
        assert_eq!(env.id, Value::Null);
    }

    #[tokio::test]
    async fn spawn_failure_echoes_request_id() {
        let outcome = unreachable_relay()
            .run(Some(r#"{"jsonrpc":"2.0","id":"req-1","method":"x"}"#), tokio::io::sink())
            .await;
        let env = envelope(outcome);
        assert_eq!(env.error.code, ErrorCode::ServerError.code());
        assert_eq!(env.id, json!("req-1"));
        assert!(env.error.message.contains("Failed to spawn"));
    }

    #[tokio::test]
    async fn emit_routes_response_to_stdout() {
        let outcome = Outcome::Response(RelayResponse::Structured(json!({"ok": true})));
        let mut out = Vec::new();
        let mut err = Vec::new();
        outcome.emit(&mut out, &mut err).await.unwrap();
        assert_eq!(out, b"{\"ok\":true}\n");
        assert!(err.is_empty());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn emit_routes_envelope_to_stderr() {
        let outcome = Outcome::Failed(ErrorEnvelope::timeout(json!(9)));
        let mut out = Vec::new();
        let mut err = Vec::new();
        outcome.emit(&mut out, &mut err).await.unwrap();
        assert!(out.is_empty());
        let line = String::from_utf8(err).unwrap();
        assert!(line.ends_with('\n'));
        let parsed: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["id"], 9);
        assert_eq!(parsed["error"]["message"], "Timeout: Request took too long");
    }

    #[tokio::test]
    async fn emit_raw_response_is_verbatim() {
        let outcome = Outcome::Response(RelayResponse::Raw(b"hello".to_vec()));
        let mut out = Vec::new();
        let mut err = Vec::new();
        outcome.emit(&mut out, &mut err).await.unwrap();
        assert_eq!(out, b"hello");
    }
}
