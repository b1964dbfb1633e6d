//! `mcp-bridge` Core Library
//!
//! Shared functionality for the bridge binary and for callers that embed it:
//! - JSON-RPC request, response and error envelope types
//! - Configuration resolution
//! - Common error types
//! - Tracing initialisation

pub mod config;
pub mod envelope;
pub mod error;
pub mod request;
pub mod response;
pub mod tracing_init;

pub use config::Config;
pub use envelope::{ErrorCode, ErrorEnvelope, RpcError};
pub use error::{Error, Result};
pub use request::RpcRequest;
pub use response::RelayResponse;
