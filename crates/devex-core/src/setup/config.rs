//! The declarative setup workflow schema.
//!
//! A `SetupConfig` is an ordered list of steps, each `info`, `question`,
//! or `action`, with navigation overrides and optional visibility
//! conditions. Workflows load from YAML; the default wizard sequence is
//! built programmatically by the wizard module.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::setup::condition::Condition;
use crate::setup::error::SetupError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SetupConfig {
    #[serde(default)]
    pub name: String,
    /// `execute` actions only run when the config opts in.
    #[serde(default)]
    pub allow_execute: bool,
    #[serde(default)]
    pub steps: Vec<SetupStep>,
}

impl SetupConfig {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SetupError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| SetupError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Index of a step by id.
    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupStep {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub navigation: Navigation,
    /// Hidden steps are skipped during navigation, in both directions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<Condition>,
    #[serde(flatten)]
    pub body: StepBody,
}

impl SetupStep {
    pub fn question(&self) -> Option<&Question> {
        match &self.body {
            StepBody::Question(question) => Some(question),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<&ActionSpec> {
        match &self.body {
            StepBody::Action(action) => Some(action),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepBody {
    Info,
    Question(Question),
    Action(ActionSpec),
}

/// Explicit navigation overrides. Resolution precedence on advance:
/// `next_step`, then the first matching `next_step_if` branch, then the
/// linear successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Navigation {
    #[serde(default)]
    pub allow_back: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_step: Option<String>,
    /// Branches keyed by `"variable=value"` (or `"variable"` for a bare
    /// existence check), mapping to a target step id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub next_step_if: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    Text,
    Select,
    MultiSelect,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Target variable in the answer store.
    pub variable: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub kind: QuestionKind,
    /// Static options; filtered per-option by `show_if`.
    #[serde(default)]
    pub options: Vec<OptionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_source: Option<OptionsSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OptionItem {
    pub value: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<Condition>,
}

impl OptionItem {
    pub fn new(value: &str, name: &str, description: &str) -> Self {
        Self {
            value: value.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            show_if: None,
        }
    }

    /// Display label, falling back to the value.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.value
        } else {
            &self.name
        }
    }
}

/// Where a question's choices come from at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionsSource {
    /// Caller uses the step's literal option list.
    Static,
    /// Pre-computed lists from the settings object, or a directory scan.
    Config {
        transform: ConfigTransform,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// Probe the running system.
    System { probe: SystemProbe },
    /// Reserved; resolves to an empty list.
    Plugin { plugin: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigTransform {
    GetLanguageNames,
    GetThemeNames,
    FilterByPlatform,
    LoadDirectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemProbe {
    Shells,
    DesktopEnvironments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Validation {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// User-facing message overriding the generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_plugin_command() -> String {
    "setup".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Install selected items; the parameter key picks the item class
    /// (`install_languages`, `install_databases`, `install_desktop_apps`)
    /// and the value names the answer variable holding the selection (or
    /// is a literal list).
    Install {
        #[serde(default)]
        parameters: HashMap<String, Value>,
    },
    /// Configure a well-known tool from collected answers.
    Configure {
        target: ConfigureTarget,
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },
    /// Generic plugin invocation with an interpolated config mapping.
    Plugin {
        plugin: String,
        #[serde(default = "default_plugin_command")]
        command: String,
        #[serde(default)]
        config_mapping: BTreeMap<String, String>,
        #[serde(default)]
        parameters: HashMap<String, Value>,
    },
    /// Run a host command. Only honored when the config opts in.
    Execute {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigureTarget {
    Shell,
    Git,
    Desktop,
}
