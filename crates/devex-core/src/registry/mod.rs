//! # DevEx Core Plugin Registry
//!
//! Read-only access to the public plugin registry: catalog types, an
//! immutable search index rebuilt per snapshot, and the HTTP client with
//! response caching.
//!
//! ## Submodules
//!
//! - [`metadata`]: [`PluginMetadata`], [`PlatformBinary`], and the
//!   [`PluginRegistry`] snapshot type.
//! - [`index`]: [`SearchIndex`]: alphabetically sorted, tag-mapped view
//!   of one snapshot; replaced wholesale on refresh so readers never lock.
//! - [`client`]: [`RegistryClient`]: `GET /api/v1/registry`,
//!   `GET /api/v1/plugins/<name>`, and cached search.
//! - [`error`]: [`RegistryError`](error::RegistryError).
pub mod client;
pub mod error;
pub mod index;
pub mod metadata;

pub use client::{RegistryClient, RegistryClientConfig};
pub use error::RegistryError;
pub use index::SearchIndex;
pub use metadata::{PlatformBinary, PluginMetadata, PluginRegistry};

// Test module declaration
#[cfg(test)]
mod tests;
