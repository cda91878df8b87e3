//! # DevEx Core Security Validators
//!
//! Input hygiene for everything that crosses a trust boundary: plugin
//! names that become file paths, values that become subprocess arguments,
//! and environment variables inherited by plugin processes.
//!
//! ## Submodules
//!
//! - [`names`]: anchored-regex validators for plugin names, docker
//!   references, port mappings, shells, and usernames.
//! - [`env`]: the blocked/dangerous/system environment variable policy,
//!   `safe_get_env` accessors, and the log sanitizer.
//! - [`error`]: [`SecurityError`](error::SecurityError).
pub mod env;
pub mod error;
pub mod names;

pub use env::{
    blocked_env_vars, safe_get_env, safe_get_env_with_default, sanitize_env_value,
    validate_environment_variable,
};
pub use error::SecurityError;
pub use names::{
    validate_container_name, validate_docker_image, validate_env_assignment, validate_plugin_name,
    validate_port_mapping, validate_shell_path, validate_username,
};
