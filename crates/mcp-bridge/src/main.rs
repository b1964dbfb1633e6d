//! mcp-bridge
//!
//! Relays one JSON-RPC request, given as the first argument, to an MCP server
//! over stdio. The response goes to stdout; failures go to stderr as JSON-RPC
//! error envelopes with exit code 1.
//!
//! Options are only recognised before a `--` separator
//! (`mcp-bridge [OPTIONS] -- <REQUEST>`). Without one, the first argument is
//! the request whatever it looks like, so `mcp-bridge --help` is a parse
//! error rather than a help screen.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use mcp_bridge::Relay;
use mcp_bridge_core::config::{Config, load_config};
use mcp_bridge_core::tracing_init::{default_filter, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "mcp-bridge")]
#[command(version, about = "Relay one JSON-RPC request to an MCP server over stdio")]
#[command(override_usage = "mcp-bridge <REQUEST>\n       mcp-bridge [OPTIONS] -- <REQUEST>")]
struct Args {
    /// Settings file (default: <config_dir>/mcp-bridge/settings.json)
    #[arg(long, env = "MCP_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// MCP server executable, looked up on PATH
    #[arg(long, env = "MCP_BRIDGE_SERVER_BIN")]
    server_bin: Option<PathBuf>,

    /// Seconds to wait for the server before killing it
    #[arg(long, env = "MCP_BRIDGE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log level filter (e.g. "warn", "info", "debug")
    #[arg(long, env = "MCP_BRIDGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long, env = "MCP_BRIDGE_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(bin) = &self.server_bin {
            config.server_bin.clone_from(bin);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        if self.log_json {
            config.log_json = true;
        }
    }
}

/// Command line split into the part clap parses and the request.
#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    /// Program name followed by the arguments before `--`.
    options: Vec<OsString>,
    request: Option<String>,
    /// Operands after the request, accepted and ignored.
    ignored: usize,
}

/// Split `argv` (program name first).
///
/// A sole argument is always the request, even `--`. When the first of
/// several arguments starts with `-` and a `--` follows, everything before the
/// separator is options and the first operand after it is the request. In
/// every other case there are no options and the first argument is the
/// request.
fn split_argv<I>(argv: I) -> Invocation
where
    I: IntoIterator<Item = OsString>,
{
    let mut argv = argv.into_iter();
    let program = argv.next().unwrap_or_else(|| OsString::from("mcp-bridge"));
    let rest: Vec<OsString> = argv.collect();

    let leads_with_option = rest
        .first()
        .is_some_and(|a| a.to_string_lossy().starts_with('-'));
    let mut options = vec![program];
    let operands = match rest.iter().position(|a| a.as_os_str() == "--") {
        Some(sep) if rest.len() > 1 && leads_with_option => {
            options.extend(rest[..sep].iter().cloned());
            &rest[sep + 1..]
        }
        _ => &rest[..],
    };

    Invocation {
        options,
        request: operands.first().map(|a| a.to_string_lossy().into_owned()),
        ignored: operands.len().saturating_sub(1),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let invocation = split_argv(std::env::args_os());
    let args = Args::parse_from(&invocation.options);

    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_tracing(&default_filter(&config.log_level), config.log_json);
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        server_bin = %config.server_bin.display(),
        timeout_secs = config.timeout_secs,
        ignored_args = invocation.ignored,
        "Starting mcp-bridge"
    );

    let relay = Relay::from_config(&config);
    let outcome = relay.run(invocation.request.as_deref(), tokio::io::stderr()).await;
    outcome
        .emit(&mut tokio::io::stdout(), &mut tokio::io::stderr())
        .await?;

    Ok(ExitCode::from(outcome.exit_code()))
}
