//! Anchored validators for identifiers that end up in file paths,
//! subprocess arguments, or container runtimes.

use std::sync::OnceLock;

use regex::Regex;

use crate::security::error::SecurityError;

/// Characters that must never appear in a plugin name, on top of the
/// shape regex. Catches path traversal and shell metacharacters.
const FORBIDDEN_NAME_FRAGMENTS: &[&str] =
    &["..", "/", "\\", "$", "`", ";", "&", "|", "<", ">"];

const PLUGIN_NAME_MIN: usize = 2;
const PLUGIN_NAME_MAX: usize = 64;

fn plugin_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

fn docker_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:[._/-][a-z0-9]+)*(?::[A-Za-z0-9][A-Za-z0-9._-]{0,127})?$")
            .unwrap()
    })
}

fn container_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,62}$").unwrap())
}

fn port_mapping_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,5}):(\d{1,5})$").unwrap())
}

fn env_assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=[^\r\n\x00]*$").unwrap())
}

fn shell_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/(?:usr/)?bin/(?:sh|bash|zsh|fish|dash)$").unwrap())
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").unwrap())
}

pub(crate) fn env_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Validate a plugin name against the registry naming policy: 2-64 chars,
/// alphanumeric first char, then alphanumerics plus `.`, `_`, `-`, with
/// path separators and shell metacharacters rejected outright.
pub fn validate_plugin_name(name: &str) -> Result<(), SecurityError> {
    if name.len() < PLUGIN_NAME_MIN || name.len() > PLUGIN_NAME_MAX {
        return Err(SecurityError::InvalidPluginName {
            name: name.to_string(),
            reason: format!(
                "length must be {}-{} characters",
                PLUGIN_NAME_MIN, PLUGIN_NAME_MAX
            ),
        });
    }
    for fragment in FORBIDDEN_NAME_FRAGMENTS {
        if name.contains(fragment) {
            return Err(SecurityError::InvalidPluginName {
                name: name.to_string(),
                reason: format!("contains forbidden sequence '{}'", fragment),
            });
        }
    }
    if !plugin_name_re().is_match(name) {
        return Err(SecurityError::InvalidPluginName {
            name: name.to_string(),
            reason: "must match ^[A-Za-z0-9][A-Za-z0-9._-]*$".to_string(),
        });
    }
    Ok(())
}

/// Validate a docker image reference (`name[:tag]`, lowercase repository).
pub fn validate_docker_image(image: &str) -> Result<(), SecurityError> {
    if docker_image_re().is_match(image) {
        Ok(())
    } else {
        Err(SecurityError::InvalidValue {
            kind: "docker image",
            value: image.to_string(),
            reason: "does not match the allowed image reference shape".to_string(),
        })
    }
}

/// Validate a docker container name.
pub fn validate_container_name(name: &str) -> Result<(), SecurityError> {
    if container_name_re().is_match(name) {
        Ok(())
    } else {
        Err(SecurityError::InvalidValue {
            kind: "container name",
            value: name.to_string(),
            reason: "must be 1-63 chars of [A-Za-z0-9_.-], starting alphanumeric".to_string(),
        })
    }
}

/// Validate a `host:container` port mapping; both sides must be 1-65535.
pub fn validate_port_mapping(mapping: &str) -> Result<(), SecurityError> {
    let caps = port_mapping_re().captures(mapping).ok_or_else(|| {
        SecurityError::InvalidValue {
            kind: "port mapping",
            value: mapping.to_string(),
            reason: "expected <host-port>:<container-port>".to_string(),
        }
    })?;
    for idx in [1, 2] {
        let port: u32 = caps[idx].parse().unwrap_or(0);
        if port == 0 || port > 65535 {
            return Err(SecurityError::InvalidValue {
                kind: "port mapping",
                value: mapping.to_string(),
                reason: "port out of range 1-65535".to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a `NAME=value` environment assignment passed to a subprocess.
pub fn validate_env_assignment(assignment: &str) -> Result<(), SecurityError> {
    if env_assignment_re().is_match(assignment) {
        Ok(())
    } else {
        Err(SecurityError::InvalidValue {
            kind: "environment assignment",
            value: assignment.to_string(),
            reason: "expected NAME=value with a well-formed name".to_string(),
        })
    }
}

/// Validate a login shell path. `chsh` only ever receives paths passing
/// this check, and always as a separated argument, never via a shell
/// string.
pub fn validate_shell_path(path: &str) -> Result<(), SecurityError> {
    if shell_path_re().is_match(path) {
        Ok(())
    } else {
        Err(SecurityError::InvalidValue {
            kind: "shell path",
            value: path.to_string(),
            reason: "not an allowed login shell".to_string(),
        })
    }
}

/// Validate a POSIX username.
pub fn validate_username(name: &str) -> Result<(), SecurityError> {
    if username_re().is_match(name) {
        Ok(())
    } else {
        Err(SecurityError::InvalidValue {
            kind: "username",
            value: name.to_string(),
            reason: "must match ^[a-z_][a-z0-9_-]{0,31}$".to_string(),
        })
    }
}
