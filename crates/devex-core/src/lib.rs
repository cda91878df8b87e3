pub mod cache;
pub mod config;
pub mod download;
pub mod kernel;
pub mod platform;
pub mod plugin_system;
pub mod registry;
pub mod security;
pub mod setup;
pub mod wizard;

// Re-export key public types for the binary and embedders.
pub use kernel::Application;
pub use kernel::error::Error as KernelError;
pub use platform::SystemInfo;
pub use plugin_system::{DefaultPluginManager, PluginInfo, SetupRequest, SetupResponse};
pub use registry::{PluginMetadata, PluginRegistry, RegistryClient};
pub use setup::{SetupConfig, SetupExecutor};
pub use wizard::{WizardKey, WizardModel};
