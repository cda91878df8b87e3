//! Error types for the security validation layer.
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Invalid plugin name '{name}': {reason}")]
    InvalidPluginName { name: String, reason: String },

    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidValue {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("Environment variable '{name}' is blocked and must not be set")]
    BlockedEnvironmentVariable { name: String },

    #[error("Unsafe value for environment variable '{name}': {reason}")]
    UnsafeEnvironmentValue { name: String, reason: String },

    #[error("Invalid environment variable name '{name}'")]
    InvalidEnvironmentName { name: String },
}
