//! Three-tier environment variable safety policy.
//!
//! - **Blocked** variables hook code injection into child processes; any
//!   non-empty value is rejected.
//! - **Dangerous** variables are legitimate but abusable; each has a
//!   dedicated validator enforcing format, allow-listed hosts, or HTTPS.
//! - **System** variables are required for normal operation but must still
//!   be well-formed (absolute paths, no traversal, no temp-dir entries).
//!
//! Everything else passes with a basic well-formedness check. Values read
//! through [`safe_get_env`] never reach a subprocess or log line without
//! going through this policy and the [`sanitize_env_value`] redactor.

use std::env;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::security::error::SecurityError;
use crate::security::names::{env_name_re, validate_shell_path, validate_username};

/// Any non-empty value for these is rejected outright.
const BLOCKED: &[&str] = &[
    "LD_PRELOAD",
    "LD_AUDIT",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "PYTHONSTARTUP",
    "IFS",
    "BASH_ENV",
    "ENV",
    "PROMPT_COMMAND",
    "PERL5OPT",
    "RUBYOPT",
    "GCONV_PATH",
];

fn secret_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(PASSWORD|PASSPHRASE|SECRET|TOKEN|API_?KEY|PRIVATE_?KEY|CREDENTIAL|AUTH)")
            .unwrap()
    })
}

fn pathlike_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(PATH|DIR|HOME|ROOT|PREFIX)$").unwrap())
}

fn is_blocked(name: &str) -> bool {
    BLOCKED.contains(&name)
}

/// Variables stripped from plugin subprocess environments.
pub fn blocked_env_vars() -> &'static [&'static str] {
    BLOCKED
}

fn require_absolute_clean(name: &str, value: &str) -> Result<(), SecurityError> {
    if !value.starts_with('/') {
        return Err(SecurityError::UnsafeEnvironmentValue {
            name: name.to_string(),
            reason: format!("'{}' is not an absolute path", value),
        });
    }
    if value.contains("..") {
        return Err(SecurityError::UnsafeEnvironmentValue {
            name: name.to_string(),
            reason: "path contains '..'".to_string(),
        });
    }
    Ok(())
}

fn is_temp_dir(entry: &str) -> bool {
    let p = Path::new(entry);
    p.starts_with("/tmp") || p.starts_with("/var/tmp") || p.starts_with("/dev/shm")
}

/// Colon-separated library/search path lists: every entry absolute, clean,
/// and outside world-writable temp directories.
fn validate_path_list(name: &str, value: &str, allow_temp: bool) -> Result<(), SecurityError> {
    for entry in value.split(':').filter(|e| !e.is_empty()) {
        require_absolute_clean(name, entry)?;
        if !allow_temp && is_temp_dir(entry) {
            return Err(SecurityError::UnsafeEnvironmentValue {
                name: name.to_string(),
                reason: format!("'{}' points into a temp directory", entry),
            });
        }
    }
    Ok(())
}

fn validate_https_url(name: &str, value: &str, allowed_hosts: &[&str]) -> Result<(), SecurityError> {
    let rest = value.strip_prefix("https://").ok_or_else(|| {
        SecurityError::UnsafeEnvironmentValue {
            name: name.to_string(),
            reason: "must be an https:// URL".to_string(),
        }
    })?;
    let host = rest.split(['/', ':']).next().unwrap_or("");
    if allowed_hosts.iter().any(|h| host == *h) {
        Ok(())
    } else {
        Err(SecurityError::UnsafeEnvironmentValue {
            name: name.to_string(),
            reason: format!("host '{}' is not allow-listed", host),
        })
    }
}

/// Validators for the dangerous tier. Returns None when the variable is
/// not in the tier.
fn validate_dangerous(name: &str, value: &str) -> Option<Result<(), SecurityError>> {
    match name {
        "LD_LIBRARY_PATH" | "PYTHONPATH" | "NODE_PATH" => {
            Some(validate_path_list(name, value, false))
        }
        "DOCKER_HOST" => Some(
            if value == "unix:///var/run/docker.sock"
                || value.starts_with("tcp://127.0.0.1")
                || value.starts_with("tcp://localhost")
            {
                Ok(())
            } else {
                Err(SecurityError::UnsafeEnvironmentValue {
                    name: name.to_string(),
                    reason: "only the local docker socket or localhost TCP is allowed".to_string(),
                })
            },
        ),
        "PIP_INDEX_URL" => Some(validate_https_url(
            name,
            value,
            &["pypi.org", "files.pythonhosted.org"],
        )),
        "NPM_CONFIG_REGISTRY" => Some(validate_https_url(name, value, &["registry.npmjs.org"])),
        _ => None,
    }
}

/// Validators for the system tier. Returns None when the variable is not
/// in the tier.
fn validate_system(name: &str, value: &str) -> Option<Result<(), SecurityError>> {
    match name {
        "PATH" => Some(validate_path_list(name, value, false)),
        "HOME" => Some(require_absolute_clean(name, value)),
        "TMPDIR" => Some(validate_path_list(name, value, true)),
        "USER" | "LOGNAME" => Some(validate_username(value).map_err(|_| {
            SecurityError::UnsafeEnvironmentValue {
                name: name.to_string(),
                reason: "not a well-formed username".to_string(),
            }
        })),
        "SHELL" => Some(validate_shell_path(value).map_err(|_| {
            SecurityError::UnsafeEnvironmentValue {
                name: name.to_string(),
                reason: "not an allowed login shell".to_string(),
            }
        })),
        _ => None,
    }
}

/// Validate an environment variable against the tiered policy.
pub fn validate_environment_variable(name: &str, value: &str) -> Result<(), SecurityError> {
    if !env_name_re().is_match(name) {
        return Err(SecurityError::InvalidEnvironmentName {
            name: name.to_string(),
        });
    }
    if is_blocked(name) {
        if value.is_empty() {
            return Ok(());
        }
        return Err(SecurityError::BlockedEnvironmentVariable {
            name: name.to_string(),
        });
    }
    if let Some(result) = validate_dangerous(name, value) {
        return result;
    }
    if let Some(result) = validate_system(name, value) {
        return result;
    }
    if value.contains('\0') {
        return Err(SecurityError::UnsafeEnvironmentValue {
            name: name.to_string(),
            reason: "contains a NUL byte".to_string(),
        });
    }
    Ok(())
}

/// Read an environment variable through the safety policy.
/// Absent ⇒ `Ok(None)`; present-but-unsafe ⇒ `Err`.
pub fn safe_get_env(name: &str) -> Result<Option<String>, SecurityError> {
    match env::var(name) {
        Ok(value) => {
            validate_environment_variable(name, &value)?;
            Ok(Some(value))
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(SecurityError::UnsafeEnvironmentValue {
            name: name.to_string(),
            reason: "value is not valid unicode".to_string(),
        }),
    }
}

/// Like [`safe_get_env`], but unsafe or absent values fall back to the
/// default (with a warning for unsafe ones).
pub fn safe_get_env_with_default(name: &str, default: &str) -> String {
    match safe_get_env(name) {
        Ok(Some(value)) => value,
        Ok(None) => default.to_string(),
        Err(err) => {
            log::warn!(
                "Ignoring unsafe value for {}: {} (using default '{}')",
                name,
                err,
                default
            );
            default.to_string()
        }
    }
}

/// Redact an environment value for logging. Secret-looking names are fully
/// masked; path-like values keep only their first entry.
pub fn sanitize_env_value(name: &str, value: &str) -> String {
    if secret_name_re().is_match(name) {
        return "***".to_string();
    }
    if pathlike_name_re().is_match(name) && value.contains(':') {
        let first = value.split(':').next().unwrap_or("");
        return format!("{}:…", first);
    }
    value.to_string()
}
