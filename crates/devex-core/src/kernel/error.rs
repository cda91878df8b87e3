//! # DevEx Core Kernel Errors
//!
//! Defines [`Error`], the top-level error enum for the application kernel.
//! Subsystem errors ([`RegistryError`](crate::registry::error::RegistryError),
//! [`DownloadError`](crate::download::error::DownloadError), etc.) convert
//! into it via `#[from]`, so `?` works across subsystem boundaries.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::download::error::DownloadError;
use crate::plugin_system::error::PluginSystemError;
use crate::registry::error::RegistryError;
use crate::security::error::SecurityError;
use crate::setup::error::SetupError;

/// Top-level error type for the DevEx application.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Typed registry client error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Typed plugin download error
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Typed setup engine error
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Typed security validation error
    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    /// Typed configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error with operation context
    #[error("I/O error during '{operation}': {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase:?} for component '{}': {message}", component_name.as_deref().unwrap_or("<unknown>"))]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        component_name: Option<String>,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Error related to ComponentRegistry operations or component lookup failures.
    #[error("Component registry error during operation '{operation}': {message}")]
    ComponentRegistryError {
        operation: String,
        component_name: Option<String>,
        message: String,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a specific phase in the kernel's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelLifecyclePhase {
    Bootstrap,
    Initialize,
    Start,
    RunPreCheck,
    Shutdown,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<std::io::Error> for Error {
    fn from(io_err: std::io::Error) -> Self {
        Error::Io {
            operation: "unknown".to_string(),
            source: io_err,
        }
    }
}

impl Error {
    /// Helper to create an I/O error with operation context.
    pub fn io(source: std::io::Error, operation: impl Into<String>) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}
