//! Error types for plugin downloads and verification.
use thiserror::Error;

use crate::registry::error::RegistryError;
use crate::security::error::SecurityError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Name(#[from] SecurityError),

    #[error("plugin '{name}' not found in registry")]
    PluginNotFound { name: String },

    #[error("plugin '{name}' not available for platform '{platform}'")]
    PlatformUnavailable { name: String, platform: String },

    #[error("plugin '{name}' has an incomplete catalog entry for '{platform}': {reason}")]
    IncompleteEntry {
        name: String,
        platform: String,
        reason: String,
    },

    /// Checksum mismatches are never recovered; the partial download is
    /// deleted before this error is returned.
    #[error("checksum mismatch for plugin '{name}': expected {expected}, actual {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("signature verification failed for plugin '{name}': {reason}")]
    SignatureInvalid { name: String, reason: String },

    #[error("download transport error for '{name}': {source}")]
    Transport {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error while installing '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Multi(#[from] MultiError),
}

/// One failed download inside a batch.
#[derive(Debug)]
pub struct DownloadFailure {
    pub plugin: String,
    pub error: DownloadError,
}

/// Aggregate of per-plugin failures from a batch download.
#[derive(Debug, Default)]
pub struct MultiError {
    pub failures: Vec<DownloadFailure>,
}

impl MultiError {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }
}

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} plugin download(s) failed:", self.failures.len())?;
        for failure in &self.failures {
            write!(f, " {} ({});", failure.plugin, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}
