//! Translates declarative step actions into plugin invocations.
//!
//! Every plugin invocation ensures the plugin is present (downloading on
//! demand), builds a setup protocol envelope, and parses the plugin's
//! stdout back into a response. A `status == "error"` response surfaces
//! the plugin's error field; other statuses are logged.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::config::settings::Settings;
use crate::platform::SystemInfo;
use crate::plugin_system::manager::DefaultPluginManager;
use crate::plugin_system::protocol::{EnvironmentInfo, SetupRequest};
use crate::setup::config::{ActionSpec, ConfigureTarget};
use crate::setup::error::SetupError;
use crate::setup::interpolate::interpolate;
use crate::setup::state::SetupState;

fn command_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").unwrap())
}

/// Result of one concrete invocation within an action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Plugin that handled the work, when one was involved.
    pub plugin: Option<String>,
    pub message: String,
}

pub struct ActionExecutor {
    manager: Arc<DefaultPluginManager>,
    settings: Arc<Settings>,
    system: SystemInfo,
    config_root: PathBuf,
    allow_execute: bool,
    dry_run: bool,
}

impl ActionExecutor {
    pub fn new(
        manager: Arc<DefaultPluginManager>,
        settings: Arc<Settings>,
        system: SystemInfo,
        config_root: PathBuf,
        allow_execute: bool,
        dry_run: bool,
    ) -> Self {
        Self {
            manager,
            settings,
            system,
            config_root,
            allow_execute,
            dry_run,
        }
    }

    /// Execute one action against the collected answers. Returns one
    /// outcome per concrete invocation (installs fan out per item).
    pub async fn execute(
        &self,
        action: &ActionSpec,
        state: &SetupState,
    ) -> Result<Vec<ActionOutcome>, SetupError> {
        match action {
            ActionSpec::Install { parameters } => self.run_install(parameters, state).await,
            ActionSpec::Configure { target, parameters } => {
                self.run_configure(*target, parameters, state).await
            }
            ActionSpec::Plugin {
                plugin,
                command,
                config_mapping,
                parameters,
            } => {
                let outcome = self
                    .run_plugin(plugin, command, config_mapping, parameters, state)
                    .await?;
                Ok(vec![outcome])
            }
            ActionSpec::Execute { command, args } => {
                let outcome = self.run_execute(command, args, state).await?;
                Ok(vec![outcome])
            }
        }
    }

    /// Resolve an install parameter to its item list: a literal array, or
    /// the name of an answer variable holding the selection.
    fn resolve_items(&self, value: &Value, state: &SetupState) -> Vec<String> {
        let as_strings = |items: &[Value]| -> Vec<String> {
            items
                .iter()
                .map(|v| crate::setup::condition::canonical(Some(v)))
                .filter(|s| !s.is_empty())
                .collect()
        };
        match value {
            Value::Array(items) => as_strings(items),
            Value::String(variable) => match state.answer(variable) {
                Some(Value::Array(items)) => as_strings(items),
                Some(Value::String(single)) if !single.is_empty() => vec![single.clone()],
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Per-item plugin configuration from the conventional YAML path.
    fn item_config(&self, path: &Path, item: &str) -> (Value, Option<PathBuf>) {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str::<Value>(&raw) {
                Ok(config) => (config, Some(path.to_path_buf())),
                Err(err) => {
                    log::warn!("Unparseable config {}: {}", path.display(), err);
                    (json!({ "name": item }), None)
                }
            },
            Err(_) => {
                log::debug!("No config at {}; passing minimal config", path.display());
                (json!({ "name": item }), None)
            }
        }
    }

    async fn run_install(
        &self,
        parameters: &HashMap<String, Value>,
        state: &SetupState,
    ) -> Result<Vec<ActionOutcome>, SetupError> {
        let mut outcomes = Vec::new();

        // The parameter key picks the item class and its handling plugin.
        for key in ["install_languages", "install_databases", "install_desktop_apps"] {
            let Some(value) = parameters.get(key) else {
                continue;
            };
            for item in self.resolve_items(value, state) {
                let (plugin, config_path) = match key {
                    "install_languages" => (
                        "mise".to_string(),
                        Settings::language_config_path(&self.config_root, &item),
                    ),
                    "install_databases" => (
                        "docker".to_string(),
                        Settings::database_config_path(&self.config_root, &item),
                    ),
                    _ => (
                        self.settings.package_manager_plugin(&self.system),
                        self.config_root
                            .join("applications")
                            .join("desktop")
                            .join(format!("{}.yaml", item)),
                    ),
                };
                let (config, config_path) = self.item_config(&config_path, &item);
                let mut params = HashMap::new();
                params.insert("name".to_string(), Value::String(item.clone()));
                let outcome = self
                    .invoke(&plugin, "install", config, params, config_path, state)
                    .await?;
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }

    async fn run_configure(
        &self,
        target: ConfigureTarget,
        parameters: &BTreeMap<String, String>,
        state: &SetupState,
    ) -> Result<Vec<ActionOutcome>, SetupError> {
        let (plugin, config) = match target {
            ConfigureTarget::Shell => (
                "tool-shell".to_string(),
                json!({
                    "shell": state.answer("shell").cloned().unwrap_or(Value::Null),
                }),
            ),
            ConfigureTarget::Git => (
                "tool-git".to_string(),
                json!({
                    "full_name": state.answer("git_full_name").cloned().unwrap_or(Value::Null),
                    "email": state.answer("git_email").cloned().unwrap_or(Value::Null),
                }),
            ),
            ConfigureTarget::Desktop => (
                format!("desktop-{}", self.system.desktop),
                json!({
                    "theme": state.answer("theme").cloned().unwrap_or(Value::Null),
                }),
            ),
        };

        let mut params = HashMap::new();
        for (key, template) in parameters {
            params.insert(
                key.clone(),
                Value::String(interpolate(template, state)),
            );
        }

        let outcome = self
            .invoke(&plugin, "configure", config, params, None, state)
            .await?;
        Ok(vec![outcome])
    }

    async fn run_plugin(
        &self,
        plugin: &str,
        command: &str,
        config_mapping: &BTreeMap<String, String>,
        parameters: &HashMap<String, Value>,
        state: &SetupState,
    ) -> Result<ActionOutcome, SetupError> {
        // `{{ var }}` placeholders in the mapping resolve from answers.
        let mut config = serde_json::Map::new();
        for (key, template) in config_mapping {
            config.insert(key.clone(), Value::String(interpolate(template, state)));
        }
        self.invoke(
            plugin,
            command,
            Value::Object(config),
            parameters.clone(),
            None,
            state,
        )
        .await
    }

    async fn run_execute(
        &self,
        command: &str,
        args: &[String],
        state: &SetupState,
    ) -> Result<ActionOutcome, SetupError> {
        if !self.allow_execute {
            return Err(SetupError::ExecuteDisabled);
        }
        if !command_word_re().is_match(command) {
            return Err(SetupError::UnsafeCommand {
                reason: format!("command '{}' contains disallowed characters", command),
            });
        }
        let args: Vec<String> = args.iter().map(|a| interpolate(a, state)).collect();
        for arg in &args {
            if arg.contains('\0') || arg.contains('\n') {
                return Err(SetupError::UnsafeCommand {
                    reason: "argument contains control characters".to_string(),
                });
            }
        }

        if self.dry_run {
            return Ok(ActionOutcome {
                plugin: None,
                message: format!("would run: {} {}", command, args.join(" ")),
            });
        }

        // Separated args, never a shell string.
        let status = tokio::process::Command::new(command)
            .args(&args)
            .status()
            .await
            .map_err(|err| SetupError::ActionFailed {
                message: format!("failed to launch '{}': {}", command, err),
            })?;
        if !status.success() {
            return Err(SetupError::ActionFailed {
                message: format!("'{}' exited with {:?}", command, status.code()),
            });
        }
        Ok(ActionOutcome {
            plugin: None,
            message: format!("ran {}", command),
        })
    }

    /// Shared plugin invocation path: ensure present (downloading on
    /// demand), build the envelope, run, interpret the response.
    async fn invoke(
        &self,
        plugin: &str,
        command: &str,
        config: Value,
        parameters: HashMap<String, Value>,
        config_path: Option<PathBuf>,
        state: &SetupState,
    ) -> Result<ActionOutcome, SetupError> {
        if self.dry_run {
            return Ok(ActionOutcome {
                plugin: Some(plugin.to_string()),
                message: format!("would invoke {} {}", plugin, command),
            });
        }

        self.manager.ensure_plugin(plugin).await?;

        let request = SetupRequest {
            command: command.to_string(),
            config,
            parameters,
            environment: EnvironmentInfo::from(&state.system),
            config_path,
        };
        let response = self
            .manager
            .executables()
            .run_protocol(plugin, command, &request)
            .await?;

        if response.is_error() {
            let message = response
                .error
                .clone()
                .unwrap_or_else(|| "plugin reported an unspecified error".to_string());
            return Err(SetupError::ActionFailed {
                message: format!("{} {}: {}", plugin, command, message),
            });
        }
        log::info!(
            "{} {} -> {:?} ({}%): {}",
            plugin,
            command,
            response.status,
            response.progress,
            response.message
        );
        Ok(ActionOutcome {
            plugin: Some(plugin.to_string()),
            message: response.message,
        })
    }
}
