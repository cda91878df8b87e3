//! Filesystem locations for configuration, caches, and installed plugins.
//!
//! `DEVEX_CONFIG_DIR`, `DEVEX_CACHE_DIR`, and `DEVEX_PLUGIN_DIR` override
//! the XDG defaults; override values pass through the env safety layer and
//! must be clean absolute paths.

use std::path::PathBuf;

use crate::kernel::constants;
use crate::security::safe_get_env;

/// Read a directory override from the environment. Unsafe or relative
/// values are ignored with a warning rather than aborting startup.
fn env_dir_override(var: &str) -> Option<PathBuf> {
    match safe_get_env(var) {
        Ok(Some(value)) => {
            let path = PathBuf::from(&value);
            if path.is_absolute() && !value.contains("..") {
                Some(path)
            } else {
                log::warn!("Ignoring {}: '{}' is not a clean absolute path", var, value);
                None
            }
        }
        Ok(None) => None,
        Err(err) => {
            log::warn!("Ignoring {}: {}", var, err);
            None
        }
    }
}

/// Root of the YAML configuration tree
/// (`config/environments/…`, `config/applications/…`, setup options).
pub fn config_dir() -> PathBuf {
    env_dir_override(constants::ENV_CONFIG_DIR)
        .or_else(|| dirs::config_dir().map(|d| d.join(constants::APP_NAME)))
        .unwrap_or_else(|| PathBuf::from(".devex/config"))
}

/// Cache root, home of `registry.json`.
pub fn cache_dir() -> PathBuf {
    env_dir_override(constants::ENV_CACHE_DIR)
        .or_else(|| dirs::cache_dir().map(|d| d.join(constants::APP_NAME)))
        .unwrap_or_else(|| PathBuf::from(".devex/cache"))
}

/// Directory holding installed `devex-plugin-*` binaries.
pub fn plugin_dir() -> PathBuf {
    env_dir_override(constants::ENV_PLUGIN_DIR)
        .or_else(|| {
            dirs::data_dir().map(|d| d.join(constants::APP_NAME).join("plugins"))
        })
        .unwrap_or_else(|| PathBuf::from(".devex/plugins"))
}
