//! One request/response exchange with an MCP server process.
//!
//! The server is spawned with piped stdio. Writing the request, draining
//! stdout, and forwarding stderr each run on their own task so that neither
//! side can stall the other on a full pipe buffer. A single deadline, armed at
//! spawn, races the whole exchange.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use mcp_bridge_core::Config;

/// Configuration for spawning the server.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Executable name (looked up on `PATH`) or path.
    pub program: PathBuf,
    /// Deadline for the whole exchange, measured from spawn.
    pub timeout: Duration,
}

impl From<&Config> for SpawnConfig {
    fn from(config: &Config) -> Self {
        Self {
            program: config.server_bin.clone(),
            timeout: config.timeout(),
        }
    }
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The process exited and its stdout was fully drained.
    Exited {
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        success: bool,
        stdout: Vec<u8>,
    },
    /// The deadline fired first; the process was killed.
    TimedOut,
}

/// Runs exchanges against one configured server binary.
#[derive(Debug, Clone)]
pub struct ServerProcess {
    config: SpawnConfig,
}

impl ServerProcess {
    pub const fn new(config: SpawnConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Spawn the server, send `input`, and collect its output.
    ///
    /// The child inherits this process's environment unchanged and gets no
    /// arguments. Its stderr is copied to `stderr_sink` chunk by chunk as it
    /// arrives.
    pub async fn exchange<W>(
        &self,
        input: String,
        stderr_sink: W,
    ) -> Result<ExchangeOutcome, SubprocessError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let program = self.config.program.display().to_string();
        let mut cmd = Command::new(&self.config.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            program = %program,
            timeout_secs = self.config.timeout.as_secs_f64(),
            "Spawning server process"
        );
        let mut child = cmd.spawn().map_err(|e| SubprocessError::SpawnFailed {
            program: program.clone(),
            reason: e.to_string(),
        })?;
        let deadline = tokio::time::Instant::now() + self.config.timeout;

        let stdin = child
            .stdin
            .take()
            .ok_or(SubprocessError::PipeUnavailable { stream: "stdin" })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(SubprocessError::PipeUnavailable { stream: "stdout" })?;
        let stderr = child
            .stderr
            .take()
            .ok_or(SubprocessError::PipeUnavailable { stream: "stderr" })?;

        let writer = tokio::spawn(write_request(stdin, input));
        let reader = tokio::spawn(drain(stdout));
        let forwarder = tokio::spawn(forward(stderr, stderr_sink));
        let abort_handles = [
            writer.abort_handle(),
            reader.abort_handle(),
            forwarder.abort_handle(),
        ];

        let result =
            tokio::time::timeout_at(deadline, wait_and_collect(&mut child, reader, forwarder))
                .await;
        writer.abort();

        if let Ok(outcome) = result {
            return outcome;
        }

        info!(program = %program, "Server process exceeded deadline, killing");
        for handle in abort_handles {
            handle.abort();
        }
        if let Err(e) = child.kill().await {
            warn!(program = %program, error = %e, "Failed to kill server process");
        }
        Ok(ExchangeOutcome::TimedOut)
    }
}

/// Wait for exit, then for both output streams to reach EOF.
async fn wait_and_collect(
    child: &mut Child,
    reader: JoinHandle<std::io::Result<Vec<u8>>>,
    forwarder: JoinHandle<()>,
) -> Result<ExchangeOutcome, SubprocessError> {
    let status = child
        .wait()
        .await
        .map_err(|e| SubprocessError::WaitFailed {
            reason: e.to_string(),
        })?;

    let stdout = reader
        .await
        .map_err(std::io::Error::other)
        .and_then(|read| read)
        .map_err(|e| SubprocessError::ReadFailed {
            reason: e.to_string(),
        })?;
    if let Err(e) = forwarder.await {
        debug!(error = %e, "stderr forwarder did not finish cleanly");
    }

    info!(?status, stdout_bytes = stdout.len(), "Server process exited");
    Ok(ExchangeOutcome::Exited {
        code: status.code(),
        success: status.success(),
        stdout,
    })
}

/// Write the request, then close stdin so the server sees EOF.
async fn write_request(mut stdin: ChildStdin, input: String) {
    if let Err(e) = stdin.write_all(input.as_bytes()).await {
        // The server may exit without reading its input.
        debug!(error = %e, "Failed to write request to server stdin");
        return;
    }
    if let Err(e) = stdin.flush().await {
        debug!(error = %e, "Failed to flush server stdin");
    }
    drop(stdin);
    debug!(bytes = input.len(), "Request written, stdin closed");
}

async fn drain<R>(mut stream: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Copy `stream` into `sink` as chunks arrive.
///
/// A failing sink stops forwarding but not reading, so the server never
/// blocks on a full stderr pipe.
async fn forward<R, W>(mut stream: R, mut sink: W)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut chunk = vec![0u8; 8 * 1024];
    let mut forwarding = true;
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "Failed to read server stderr");
                break;
            }
        };
        if forwarding {
            let written = async {
                sink.write_all(&chunk[..n]).await?;
                sink.flush().await
            }
            .await;
            if let Err(e) = written {
                warn!(error = %e, "Failed to forward server stderr, discarding the rest");
                forwarding = false;
            }
        }
    }
}

/// Errors from subprocess operations.
#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("Failed to spawn {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Failed to capture {stream}")]
    PipeUnavailable { stream: &'static str },

    #[error("Failed to wait for process: {reason}")]
    WaitFailed { reason: String },

    #[error("Failed to read process output: {reason}")]
    ReadFailed { reason: String },
}
