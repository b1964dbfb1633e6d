//! Server subprocess handling.

pub mod exchange;

pub use exchange::{ExchangeOutcome, ServerProcess, SpawnConfig, SubprocessError};
