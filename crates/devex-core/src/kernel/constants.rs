//! Application-wide constants.

/// Application name
pub const APP_NAME: &str = "devex";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filename prefix for installed plugin binaries
pub const PLUGIN_PREFIX: &str = "devex-plugin-";

/// Registry API paths
pub const REGISTRY_API_REGISTRY: &str = "/api/v1/registry";
pub const REGISTRY_API_PLUGINS: &str = "/api/v1/plugins";

/// Default public plugin registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.devex.sh";

/// Filename of the on-disk registry snapshot inside the cache directory
pub const REGISTRY_CACHE_FILE: &str = "registry.json";

/// Environment variables consumed by the application. All values pass
/// through the env safety layer before use.
pub const ENV_NONINTERACTIVE: &str = "DEVEX_NONINTERACTIVE";
pub const ENV_PLUGIN_TIMEOUT: &str = "DEVEX_PLUGIN_TIMEOUT";
pub const ENV_ENVIRONMENT: &str = "DEVEX_ENV";
pub const ENV_CRITICAL_PLUGINS: &str = "DEVEX_CRITICAL_PLUGINS";
pub const ENV_CONFIG_DIR: &str = "DEVEX_CONFIG_DIR";
pub const ENV_PLUGIN_DIR: &str = "DEVEX_PLUGIN_DIR";
pub const ENV_CACHE_DIR: &str = "DEVEX_CACHE_DIR";

/// Default timeout for registry HTTP calls, seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Timeout for a `--plugin-info` probe, seconds
pub const PLUGIN_INFO_TIMEOUT_SECS: u64 = 10;

/// Default timeout for a plugin setup invocation, seconds.
/// Overridden by `DEVEX_PLUGIN_TIMEOUT`.
pub const DEFAULT_PLUGIN_TIMEOUT_SECS: u64 = 120;

/// How long scanned plugin metadata stays fresh, seconds
pub const PLUGIN_METADATA_TTL_SECS: u64 = 30;

/// Registry snapshot freshness on disk: development and production
pub const REGISTRY_CACHE_TTL_DEV_SECS: u64 = 5 * 60;
pub const REGISTRY_CACHE_TTL_SECS: u64 = 60 * 60;

/// Built-in critical plugin set, used when neither configuration nor
/// `DEVEX_CRITICAL_PLUGINS` names one.
pub const DEFAULT_CRITICAL_PLUGINS: &[&str] = &[
    "tool-shell",
    "desktop-gnome",
    "desktop-kde",
    "tool-git",
];

/// Bound on collected installation error messages. When the list is full
/// the final slot is replaced by a truncation sentinel.
pub const MAX_ERROR_MESSAGES: usize = 10;
