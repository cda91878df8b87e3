//! # DevEx Core Plugin System
//!
//! Lifecycle of the helper binaries that do the actual installation work.
//! Plugins are independent subprocesses speaking JSON over stdin/stdout;
//! this module covers everything between "name in the registry" and
//! "verified binary answering the setup protocol".
//!
//! ## Submodules
//!
//! - [`executable`]: [`ExecutableManager`]: plugin directory scanning,
//!   `--plugin-info` probing with a metadata cache, install/remove, and
//!   the protocol subprocess runner.
//! - [`protocol`]: the [`SetupRequest`]/[`SetupResponse`] wire envelopes
//!   and the `--plugin-info` discovery document.
//! - [`validator`]: [`PluginValidator`]: two-phase validation with
//!   critical-first ordering and a bounded worker pool.
//! - [`updater`]: [`BackgroundUpdater`]: periodic registry polling and
//!   opt-in plugin refresh.
//! - [`manager`]: [`DefaultPluginManager`]: the kernel component tying
//!   the above together, including download-on-demand.
//! - [`error`]: [`PluginSystemError`](error::PluginSystemError) and the
//!   error classifier.
pub mod error;
pub mod executable;
pub mod manager;
pub mod protocol;
pub mod updater;
pub mod validator;

pub use error::{classify_error, enhance_error, ErrorCategory, PluginSystemError};
pub use executable::ExecutableManager;
pub use manager::{DefaultPluginManager, PluginSystemStatus};
pub use protocol::{EnvironmentInfo, PluginInfo, SetupRequest, SetupResponse, SetupStatus};
pub use updater::{BackgroundUpdater, UpdateStatus, DEFAULT_UPDATE_INTERVAL};
pub use validator::{
    PluginValidator, ValidationReport, ValidationResult, ValidationStatus, ValidatorConfig,
};

// Test module declaration
#[cfg(test)]
mod tests;
