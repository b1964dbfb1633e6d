//! Configuration resolution for mcp-bridge.
//!
//! Resolution order (lowest to highest):
//! 1. Built-in defaults
//! 2. Settings file (explicit path, else `<config_dir>/mcp-bridge/settings.json`)
//! 3. CLI arguments and their environment variables, applied by the binary

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Server binary launched when nothing else is configured.
pub const DEFAULT_SERVER_BIN: &str = "zubeid-youtube-mcp-server";

/// Deadline for one exchange when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Executable name (resolved via `PATH`) or path of the MCP server.
    pub server_bin: PathBuf,
    /// Seconds the server may run before it is killed.
    pub timeout_secs: u64,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_bin: PathBuf::from(DEFAULT_SERVER_BIN),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "warn".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject values that would make every exchange fail.
    pub fn validate(&self) -> Result<()> {
        if self.server_bin.as_os_str().is_empty() {
            return Err(Error::Config("server_bin must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the global settings file is
/// read when present and defaults are used otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };
    config.validate()?;
    Ok(config)
}

/// Get the global settings file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mcp-bridge").join("settings.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_30s_timeout() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.server_bin, PathBuf::from(DEFAULT_SERVER_BIN));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"timeout_secs": 5}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.server_bin, PathBuf::from(DEFAULT_SERVER_BIN));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ nope").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_server_bin_is_rejected() {
        let config = Config {
            server_bin: PathBuf::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
