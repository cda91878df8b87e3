//! The setup protocol: the JSON-in/JSON-out contract between the host and
//! a plugin subprocess.
//!
//! The host launches `<plugin-binary> <command>`, writes one
//! [`SetupRequest`] to stdin, and reads one [`SetupResponse`] from stdout.
//! stderr is free-form log output, captured and surfaced on failure.
//! Every plugin additionally answers `--plugin-info` with a [`PluginInfo`]
//! document for discovery.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::SystemInfo;

/// Platform facts handed to every plugin invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os: String,
    pub distribution: String,
    pub desktop: String,
    pub arch: String,
    pub has_desktop: bool,
}

impl From<&SystemInfo> for EnvironmentInfo {
    fn from(system: &SystemInfo) -> Self {
        Self {
            os: system.os.clone(),
            distribution: system.distribution.clone(),
            desktop: system.desktop.clone(),
            arch: system.arch.clone(),
            has_desktop: system.has_desktop(),
        }
    }
}

/// Input envelope written to the plugin's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupRequest {
    pub command: String,
    /// Plugin-specific configuration document (often a parsed YAML file).
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    pub environment: EnvironmentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStatus {
    InProgress,
    Success,
    Error,
}

/// Output envelope read from the plugin's stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupResponse {
    pub status: SetupStatus,
    /// 0-100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SetupResponse {
    /// Wrap non-JSON stdout as a successful plain-text response.
    pub fn plain_text(output: &str) -> Self {
        Self {
            status: SetupStatus::Success,
            progress: 100,
            message: output.trim().to_string(),
            data: None,
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == SetupStatus::Error
    }
}

/// Discovery document returned by `--plugin-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PluginInfo {
    /// Synthetic entry for a binary that failed the `--plugin-info`
    /// probe; it still appears in listings so the wizard can report it.
    pub fn unknown(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "unknown".to_string(),
            description: String::new(),
            tags: Vec::new(),
        }
    }
}
