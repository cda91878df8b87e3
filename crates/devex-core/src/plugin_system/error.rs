//! # DevEx Core Plugin System Errors
//!
//! [`PluginSystemError`] covers executable discovery, subprocess
//! invocation, protocol envelope handling, and validation. The module also
//! hosts the error classifier that wraps surfaced messages with an
//! actionable remediation sentence.

use thiserror::Error;

use crate::download::error::DownloadError;
use crate::registry::error::RegistryError;
use crate::security::error::SecurityError;

#[derive(Debug, Error)]
pub enum PluginSystemError {
    #[error("plugin '{plugin}' is not installed")]
    NotInstalled { plugin: String },

    #[error("failed to launch plugin '{plugin}': {source}")]
    Launch {
        plugin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin '{plugin}' timed out after {seconds}s during '{operation}'")]
    Timeout {
        plugin: String,
        operation: String,
        seconds: u64,
    },

    #[error("plugin '{plugin}' exited with status {code:?}: {stderr}")]
    ExitFailure {
        plugin: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("plugin '{plugin}' returned a malformed envelope: {reason}")]
    MalformedEnvelope { plugin: String, reason: String },

    #[error("plugin '{plugin}' reported an error: {message}")]
    PluginReported { plugin: String, message: String },

    #[error("I/O error for plugin '{plugin}': {source}")]
    Io {
        plugin: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Name(#[from] SecurityError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Coarse failure class derived from an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Permission,
    Disk,
    Other,
}

const NETWORK_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "unreachable",
    "dns",
    "connection",
    "no route",
    "tls",
    "temporary failure",
];
const PERMISSION_MARKERS: &[&str] =
    &["permission", "access denied", "operation not permitted"];
const DISK_MARKERS: &[&str] = &["no space", "disk full", "read-only file system", "quota"];

/// Classify an error message by substring match.
pub fn classify_error(text: &str) -> ErrorCategory {
    let lowered = text.to_lowercase();
    if NETWORK_MARKERS.iter().any(|m| lowered.contains(m)) {
        ErrorCategory::Network
    } else if PERMISSION_MARKERS.iter().any(|m| lowered.contains(m)) {
        ErrorCategory::Permission
    } else if DISK_MARKERS.iter().any(|m| lowered.contains(m)) {
        ErrorCategory::Disk
    } else {
        ErrorCategory::Other
    }
}

/// Wrap an error message with class-specific remediation guidance.
pub fn enhance_error(text: &str) -> String {
    match classify_error(text) {
        ErrorCategory::Network => format!(
            "{}: check your network connection; the plugin registry may be temporarily unreachable",
            text
        ),
        ErrorCategory::Permission => format!(
            "{}: check permissions on the plugin directory or rerun with sufficient privileges",
            text
        ),
        ErrorCategory::Disk => format!("{}: free up disk space and retry", text),
        ErrorCategory::Other => text.to_string(),
    }
}
