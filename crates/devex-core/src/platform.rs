//! Platform facts used by conditions, the setup protocol, and binary
//! selection.
//!
//! Full OS-level detection (reading `/etc/os-release`, session probing) is
//! an external concern; this module carries the facts themselves plus the
//! cheap env/const-based detection the core needs to stand alone.

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Desktop environment strings that mean "no desktop".
const NO_DESKTOP: &[&str] = &["", "none", "unknown"];

/// Detected platform facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub distribution: String,
    pub desktop: String,
    pub arch: String,
}

impl SystemInfo {
    /// Detect platform facts from compile-time constants and the session
    /// environment. Distribution detection proper lives outside the core;
    /// unknown facts come back as `"unknown"`.
    pub fn detect() -> Self {
        let desktop = env::var("XDG_CURRENT_DESKTOP")
            .map(|v| normalize_desktop(&v))
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            os: env::consts::OS.to_string(),
            distribution: env::var("DEVEX_DISTRIBUTION")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|_| "unknown".to_string()),
            desktop,
            arch: go_arch(env::consts::ARCH).to_string(),
        }
    }

    /// Whether a desktop environment is present.
    pub fn has_desktop(&self) -> bool {
        !NO_DESKTOP.contains(&self.desktop.as_str())
    }

    /// Key used to select a platform binary from the registry catalog,
    /// e.g. `linux-amd64`.
    pub fn platform_key(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Facts as a JSON map, for condition evaluation and template
    /// interpolation.
    pub fn as_map(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("os".to_string(), Value::String(self.os.clone()));
        map.insert(
            "distribution".to_string(),
            Value::String(self.distribution.clone()),
        );
        map.insert("desktop".to_string(), Value::String(self.desktop.clone()));
        map.insert("arch".to_string(), Value::String(self.arch.clone()));
        map.insert("has_desktop".to_string(), Value::Bool(self.has_desktop()));
        map
    }
}

/// `XDG_CURRENT_DESKTOP` can carry a colon-separated chain such as
/// `ubuntu:GNOME`; the last component names the actual environment.
pub fn normalize_desktop(raw: &str) -> String {
    let last = raw
        .split(':')
        .next_back()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    if last.is_empty() {
        "unknown".to_string()
    } else {
        last
    }
}

/// The registry catalog keys platforms with Go-style architecture names.
pub fn go_arch(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "arm" => "arm",
        other => other,
    }
}
