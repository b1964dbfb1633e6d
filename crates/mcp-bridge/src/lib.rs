//! mcp-bridge
//!
//! Relays a single JSON-RPC request to an MCP server spoken to over stdio:
//! the request goes to the server's stdin, the server's stdout comes back as
//! the response, and every failure becomes a JSON-RPC error envelope.
//!
//! The `mcp-bridge` binary feeds [`Relay::run`] its first argument. Programs
//! embedding the bridge can skip argument parsing: build a request with
//! [`mcp_bridge_core::RpcRequest::call`] and pass it to [`Relay::send`].

pub mod relay;
pub mod subprocess;

pub use relay::{Outcome, Relay};
