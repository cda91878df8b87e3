//! Resolves dynamic option lists for questions.
//!
//! Sources: the settings object (language/theme lists, platform-filtered
//! apps), a directory of `{name, description}` YAML files (filename stem
//! becomes the option value), or a system probe (known shells, desktop
//! environments). The `plugin` source is reserved and resolves empty.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::config::settings::Settings;
use crate::platform::SystemInfo;
use crate::setup::config::{ConfigTransform, OptionItem, OptionsSource, SystemProbe};
use crate::setup::error::SetupError;

/// Shape of a setup-option YAML file.
#[derive(Debug, Deserialize)]
struct OptionFile {
    name: String,
    #[serde(default)]
    description: String,
}

pub struct OptionsLoader {
    settings: Arc<Settings>,
    system: SystemInfo,
    config_root: PathBuf,
}

impl OptionsLoader {
    pub fn new(settings: Arc<Settings>, system: SystemInfo, config_root: PathBuf) -> Self {
        Self {
            settings,
            system,
            config_root,
        }
    }

    /// Resolve an options source to a concrete list.
    pub fn load(&self, source: &OptionsSource) -> Result<Vec<OptionItem>, SetupError> {
        match source {
            OptionsSource::Static => Ok(Vec::new()),
            OptionsSource::Config { transform, path } => self.load_config(*transform, path),
            OptionsSource::System { probe } => Ok(self.load_system(*probe)),
            OptionsSource::Plugin { plugin } => {
                log::debug!("Plugin options source '{}' is reserved; returning empty", plugin);
                Ok(Vec::new())
            }
        }
    }

    fn load_config(
        &self,
        transform: ConfigTransform,
        path: &Option<PathBuf>,
    ) -> Result<Vec<OptionItem>, SetupError> {
        match transform {
            ConfigTransform::GetLanguageNames => Ok(self
                .settings
                .language_items()
                .iter()
                .map(|item| {
                    OptionItem::new(&item.effective_value(), &item.name, &item.description)
                })
                .collect()),
            ConfigTransform::GetThemeNames => Ok(self
                .settings
                .theme_items()
                .iter()
                .map(|item| {
                    OptionItem::new(&item.effective_value(), &item.name, &item.description)
                })
                .collect()),
            ConfigTransform::FilterByPlatform => Ok(self
                .settings
                .desktop_apps_for(&self.system)
                .iter()
                .map(|app| {
                    OptionItem::new(
                        &crate::config::settings::slugify(&app.name),
                        &app.name,
                        &app.description,
                    )
                })
                .collect()),
            ConfigTransform::LoadDirectory => {
                let dir = match path {
                    Some(p) if p.is_absolute() => p.clone(),
                    Some(p) => self.config_root.join(p),
                    None => {
                        return Err(SetupError::InvalidCondition {
                            reason: "load_directory requires a path".to_string(),
                        })
                    }
                };
                self.load_directory(&dir)
            }
        }
    }

    /// Enumerate `*.yaml`/`*.yml` files in a directory. Sub-directories
    /// and other extensions are ignored; unparseable files are skipped
    /// silently; a directory with no option files is an error.
    fn load_directory(&self, dir: &Path) -> Result<Vec<OptionItem>, SetupError> {
        let entries = std::fs::read_dir(dir).map_err(|_| SetupError::EmptyOptionsDirectory {
            path: dir.to_path_buf(),
        })?;

        let mut yaml_files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
            })
            .collect();
        if yaml_files.is_empty() {
            return Err(SetupError::EmptyOptionsDirectory {
                path: dir.to_path_buf(),
            });
        }
        yaml_files.sort();

        let mut options = Vec::new();
        for file in yaml_files {
            let raw = match std::fs::read_to_string(&file) {
                Ok(raw) => raw,
                Err(_) => continue,
            };
            let parsed: OptionFile = match serde_yaml::from_str(&raw) {
                Ok(parsed) => parsed,
                Err(_) => continue,
            };
            let stem = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            options.push(OptionItem::new(&stem, &parsed.name, &parsed.description));
        }
        Ok(options)
    }

    fn load_system(&self, probe: SystemProbe) -> Vec<OptionItem> {
        match probe {
            SystemProbe::Shells => vec![
                OptionItem::new("bash", "Bash", "The GNU Bourne Again shell"),
                OptionItem::new("zsh", "Zsh", "Extended Bourne shell with plugins"),
                OptionItem::new("fish", "Fish", "Friendly interactive shell"),
            ],
            SystemProbe::DesktopEnvironments => {
                if self.system.os == "linux" {
                    vec![
                        OptionItem::new("gnome", "GNOME", "GNOME desktop environment"),
                        OptionItem::new("kde", "KDE Plasma", "KDE Plasma desktop"),
                        OptionItem::new("xfce", "Xfce", "Lightweight desktop"),
                        OptionItem::new("mate", "MATE", "Traditional desktop"),
                    ]
                } else {
                    Vec::new()
                }
            }
        }
    }
}
