//! # DevEx Core Plugin Downloader
//!
//! Fetch-and-verify pipeline for plugin binaries: platform-aware catalog
//! selection, streaming SHA-256 enforcement, optional OpenPGP signature
//! checks, atomic installation, on-disk registry caching with stale
//! fallback, and the multi-plugin failure policy.
pub mod downloader;
pub mod error;
pub mod policy;
pub mod verify;

pub use downloader::{Downloader, DownloaderConfig};
pub use error::{DownloadError, DownloadFailure, MultiError};
pub use policy::DownloadStrategy;
pub use verify::{sha256_file, SignatureOutcome, SignatureVerifier};

// Test module declaration
#[cfg(test)]
mod tests;
