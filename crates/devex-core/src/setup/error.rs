//! Error types for the dynamic setup engine.
use std::path::PathBuf;

use thiserror::Error;

use crate::plugin_system::error::PluginSystemError;
use crate::security::error::SecurityError;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unknown step '{id}'")]
    UnknownStep { id: String },

    #[error("no step at index {index}")]
    StepOutOfRange { index: usize },

    #[error("navigation back is not allowed from step '{id}'")]
    BackNotAllowed { id: String },

    #[error("invalid condition: {reason}")]
    InvalidCondition { reason: String },

    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot compare non-numeric value of '{variable}' ({value})")]
    NonNumericComparison { variable: String, value: String },

    #[error("invalid answer for '{variable}': {message}")]
    AnswerInvalid { variable: String, message: String },

    #[error("options directory '{path}' has no option files")]
    EmptyOptionsDirectory { path: PathBuf },

    #[error("failed to read setup config '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse setup config '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("execute actions are disabled by configuration")]
    ExecuteDisabled,

    #[error("unsafe command rejected: {reason}")]
    UnsafeCommand { reason: String },

    #[error("action failed: {message}")]
    ActionFailed { message: String },

    #[error(transparent)]
    Plugin(#[from] PluginSystemError),

    #[error(transparent)]
    Security(#[from] SecurityError),
}
