//! Configuration loading traits and types.
//!
//! Every PRU I/O configuration file is TOML with a `[shared]` table for the
//! fields common to all processes. Loading goes through the blanket
//! [`ConfigLoader`] trait; semantic checks are left to each config type.
//!
//! ```rust,no_run
//! use pruio_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct ToolConfig {
//!     shared: SharedConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ToolConfig::load(Path::new("/etc/pruio/pruio.toml"))?;
//!     config.shared.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File exists but could not be read, or is not valid TOML for the type.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Values parsed but are not acceptable.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log verbosity, lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-cycle detail.
    Trace,
    /// Channel discovery and registration detail.
    Debug,
    /// Session lifecycle.
    #[default]
    Info,
    /// Degraded operation.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Fields common to every PRU I/O process.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "pruio-bench-01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier used in log lines.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "pruio".to_string(),
        }
    }
}

impl SharedConfig {
    /// Reject an empty service name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a configuration type from a TOML file.
///
/// Implemented for every `DeserializeOwned` type.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and parse `path`.
    ///
    /// # Errors
    /// `FileNotFound` when the file is missing, `ParseError` for IO or
    /// TOML failures.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::ParseError(format!("{}: {e}", path.display()))
            }
        })?;
        Self::parse(&content)
    }

    /// Parse TOML text.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
