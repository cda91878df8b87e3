//! Application settings loaded from the YAML config root.
//!
//! Settings feed the options loader (language/database/theme lists), the
//! validator (critical plugin override), and the non-interactive defaults.
//! Missing files or empty lists fall back to built-in defaults so a bare
//! installation still produces a usable wizard.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::platform::SystemInfo;

/// Settings filename inside the config root.
const SETTINGS_FILE: &str = "settings.yaml";

/// A selectable item: display name, optional stable value, description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NamedItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Stable identifier used for config paths and answers; derived from
    /// the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl NamedItem {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: None,
        }
    }

    /// The answer/config identifier for this item.
    pub fn effective_value(&self) -> String {
        match &self.value {
            Some(v) if !v.is_empty() => v.clone(),
            _ => slugify(&self.name),
        }
    }
}

/// A desktop application entry, optionally restricted to platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DesktopApp {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Platform keys (`linux`, `darwin`, …) the app is available on.
    /// Empty means every platform.
    #[serde(default)]
    pub platforms: Vec<String>,
}

/// Selections applied when running non-interactively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonInteractiveDefaults {
    pub shell: String,
    pub languages: Vec<String>,
    pub databases: Vec<String>,
}

impl Default for NonInteractiveDefaults {
    fn default() -> Self {
        Self {
            shell: "zsh".to_string(),
            languages: vec!["nodejs".to_string(), "python".to_string()],
            databases: vec!["postgresql".to_string()],
        }
    }
}

/// Root settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub programming_languages: Vec<NamedItem>,
    #[serde(default)]
    pub databases: Vec<NamedItem>,
    #[serde(default)]
    pub themes: Vec<NamedItem>,
    #[serde(default)]
    pub desktop_apps: Vec<DesktopApp>,
    /// Overrides the built-in critical plugin set when non-empty.
    #[serde(default)]
    pub critical_plugins: Vec<String>,
    /// Plugin used for desktop application installs; defaults per distro.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager_plugin: Option<String>,
    #[serde(default)]
    pub defaults: NonInteractiveDefaults,
    /// Extra configuration keys plugins or conditions may consult.
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Settings {
    /// Load `settings.yaml` from the config root. A missing file is not an
    /// error: built-in defaults apply.
    pub fn load(config_root: &Path) -> Result<Self, ConfigError> {
        let path = config_root.join(SETTINGS_FILE);
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Programming languages, falling back to the built-in list when the
    /// config supplies none.
    pub fn language_items(&self) -> Vec<NamedItem> {
        if !self.programming_languages.is_empty() {
            return self.programming_languages.clone();
        }
        vec![
            NamedItem::new("Node.js", "JavaScript runtime built on V8"),
            NamedItem::new("Python", "General-purpose language with a huge ecosystem"),
            NamedItem::new("Go", "Compiled language for simple concurrent services"),
            NamedItem::new("Rust", "Memory-safe systems programming"),
            NamedItem::new("Ruby", "Dynamic language optimized for productivity"),
        ]
    }

    pub fn database_items(&self) -> Vec<NamedItem> {
        if !self.databases.is_empty() {
            return self.databases.clone();
        }
        vec![
            NamedItem::new("PostgreSQL", "Advanced open source relational database"),
            NamedItem::new("MySQL", "Popular relational database"),
            NamedItem::new("Redis", "In-memory data structure store"),
            NamedItem::new("MongoDB", "Document database"),
        ]
    }

    pub fn theme_items(&self) -> Vec<NamedItem> {
        if !self.themes.is_empty() {
            return self.themes.clone();
        }
        vec![
            NamedItem::new("Tokyo Night", "Dark theme with vivid accents"),
            NamedItem::new("Catppuccin", "Soothing pastel theme"),
            NamedItem::new("Nord", "Arctic, bluish color palette"),
            NamedItem::new("Gruvbox", "Retro groove color scheme"),
        ]
    }

    /// Desktop applications available on the given platform.
    pub fn desktop_apps_for(&self, system: &SystemInfo) -> Vec<DesktopApp> {
        self.desktop_apps
            .iter()
            .filter(|app| app.platforms.is_empty() || app.platforms.contains(&system.os))
            .cloned()
            .collect()
    }

    /// Plugin handling plain package installs, e.g. `package-manager-apt`.
    pub fn package_manager_plugin(&self, system: &SystemInfo) -> String {
        if let Some(explicit) = &self.package_manager_plugin {
            return explicit.clone();
        }
        match system.distribution.as_str() {
            "fedora" | "rhel" | "centos" => "package-manager-dnf".to_string(),
            "arch" => "package-manager-pacman".to_string(),
            _ => "package-manager-apt".to_string(),
        }
    }

    /// Conventional config file for a language install.
    pub fn language_config_path(config_root: &Path, lang: &str) -> PathBuf {
        config_root
            .join("environments")
            .join("programming-languages")
            .join(format!("{}.yaml", lang))
    }

    /// Conventional config file for a database install.
    pub fn database_config_path(config_root: &Path, db: &str) -> PathBuf {
        config_root
            .join("applications")
            .join("databases")
            .join(format!("{}.yaml", db))
    }
}

/// Derive a stable identifier from a display name: lowercase
/// alphanumerics, spaces to dashes, everything else dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if ch == ' ' || ch == '-' || ch == '_' {
            slug.push('-');
        }
        // Dots and other punctuation are dropped: "Node.js" -> "nodejs".
    }
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    slug.trim_matches('-').to_string()
}
