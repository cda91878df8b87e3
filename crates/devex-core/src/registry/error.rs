//! Error types for the registry client.
use thiserror::Error;

use crate::security::error::SecurityError;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Non-2xx response. `message` is the `{"error": "…"}` body field when
    /// the registry sent one, otherwise the raw body.
    #[error("registry returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("registry transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error("failed to parse registry response: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Name(#[from] SecurityError),

    #[error("plugin '{name}' not found in registry")]
    PluginNotFound { name: String },
}

impl RegistryError {
    /// HTTP status code, when the error carries one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            RegistryError::Http { status, .. } => Some(*status),
            RegistryError::Transport { source } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
