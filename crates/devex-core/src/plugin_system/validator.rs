//! Two-phase plugin validation.
//!
//! Critical plugins are validated sequentially, in input order, before any
//! worker starts; with `fail_on_critical` set, the first critical failure
//! terminates the whole run with partial results. The remaining plugins go
//! through a bounded worker pool, and results are re-sorted into input
//! order so reports are deterministic regardless of completion order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::kernel::constants;
use crate::plugin_system::error::enhance_error;
use crate::plugin_system::executable::ExecutableManager;
use crate::plugin_system::protocol::PluginInfo;
use crate::platform::SystemInfo;
use crate::registry::metadata::PluginRegistry;
use crate::security::{safe_get_env, validate_plugin_name};

/// Outcome for one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
    Valid,
    Missing,
    /// The registry could not be reached; nothing can be verified, but
    /// setup continues in degraded mode.
    RegistryUnavailable,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub plugin: String,
    pub critical: bool,
    pub status: ValidationStatus,
    pub message: Option<String>,
}

impl ValidationResult {
    /// Whether this result lets setup proceed. Registry outage is
    /// degraded-but-ok by design.
    pub fn ok(&self) -> bool {
        matches!(
            self.status,
            ValidationStatus::Valid | ValidationStatus::RegistryUnavailable
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Results in the same order as the input list.
    pub results: Vec<ValidationResult>,
    pub critical_failures: usize,
    /// True when a critical failure terminated validation early.
    pub aborted: bool,
}

impl ValidationReport {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok())
    }

    pub fn degraded(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.status == ValidationStatus::RegistryUnavailable)
    }
}

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Explicit critical set; highest precedence when set.
    pub critical: Option<Vec<String>>,
    pub fail_on_critical: bool,
    /// Worker pool size for the parallel phase.
    pub concurrency: usize,
    /// Deadline per integrity check.
    pub verification_timeout: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            critical: None,
            fail_on_critical: false,
            concurrency: num_cpus::get().clamp(1, 4),
            verification_timeout: Duration::from_secs(30),
        }
    }
}

pub struct PluginValidator {
    executables: Arc<ExecutableManager>,
    system: SystemInfo,
    config: ValidatorConfig,
    /// Critical set from app settings (`plugin.critical`), consulted after
    /// the environment override.
    settings_critical: Vec<String>,
}

impl std::fmt::Debug for PluginValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginValidator")
            .field("concurrency", &self.config.concurrency)
            .field("fail_on_critical", &self.config.fail_on_critical)
            .finish()
    }
}

impl PluginValidator {
    pub fn new(
        executables: Arc<ExecutableManager>,
        system: SystemInfo,
        settings_critical: Vec<String>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            executables,
            system,
            config,
            settings_critical,
        }
    }

    /// Resolve the critical plugin set: explicit config, then
    /// `DEVEX_CRITICAL_PLUGINS`, then the settings key, then built-ins.
    /// Invalid names in the env override are logged and dropped.
    pub fn resolve_critical_set(&self) -> HashSet<String> {
        if let Some(explicit) = &self.config.critical {
            return explicit.iter().cloned().collect();
        }

        if let Ok(Some(raw)) = safe_get_env(constants::ENV_CRITICAL_PLUGINS) {
            if !raw.trim().is_empty() {
                let mut set = HashSet::new();
                for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                    match validate_plugin_name(name) {
                        Ok(()) => {
                            set.insert(name.to_string());
                        }
                        Err(err) => log::warn!(
                            "Dropping invalid name in {}: {}",
                            constants::ENV_CRITICAL_PLUGINS,
                            err
                        ),
                    }
                }
                if !set.is_empty() {
                    return set;
                }
            }
        }

        if !self.settings_critical.is_empty() {
            return self.settings_critical.iter().cloned().collect();
        }

        constants::DEFAULT_CRITICAL_PLUGINS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Validate the required plugins against the installed set and, when a
    /// registry snapshot is available, catalog integrity.
    pub async fn validate(
        &self,
        required: &[String],
        registry: Option<Arc<PluginRegistry>>,
    ) -> ValidationReport {
        let critical_set = self.resolve_critical_set();
        let installed = Arc::new(self.executables.list_plugins().await);
        let platform_key = self.system.platform_key();

        let mut slots: Vec<Option<ValidationResult>> = vec![None; required.len()];
        let mut critical_failures = 0usize;
        let mut remaining: Vec<(usize, String)> = Vec::new();

        // Phase 1: criticals, sequential and blocking, input order.
        for (idx, name) in required.iter().enumerate() {
            if !critical_set.contains(name) {
                remaining.push((idx, name.clone()));
                continue;
            }
            let result = validate_single(
                name,
                true,
                &installed,
                registry.as_deref(),
                &self.executables,
                &platform_key,
                self.config.verification_timeout,
            )
            .await;
            let failed = !result.ok();
            slots[idx] = Some(result);
            if failed {
                critical_failures += 1;
                if self.config.fail_on_critical {
                    // Early termination: no workers are spawned for the
                    // remaining plugins.
                    let results = slots.into_iter().flatten().collect();
                    return ValidationReport {
                        results,
                        critical_failures,
                        aborted: true,
                    };
                }
            }
        }

        // Phase 2: the rest through a bounded worker pool.
        if !remaining.is_empty() {
            let workers = self.config.concurrency.clamp(1, remaining.len());
            let (work_tx, work_rx) = mpsc::channel::<(usize, String)>(remaining.len());
            let work_rx = Arc::new(Mutex::new(work_rx));
            let (result_tx, mut result_rx) = mpsc::channel(remaining.len());

            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let installed = installed.clone();
                let registry = registry.clone();
                let executables = self.executables.clone();
                let platform_key = platform_key.clone();
                let timeout = self.config.verification_timeout;
                handles.push(tokio::spawn(async move {
                    loop {
                        let item = { work_rx.lock().await.recv().await };
                        let Some((idx, name)) = item else { break };
                        let result = validate_single(
                            &name,
                            false,
                            &installed,
                            registry.as_deref(),
                            &executables,
                            &platform_key,
                            timeout,
                        )
                        .await;
                        if result_tx.send((idx, result)).await.is_err() {
                            break;
                        }
                    }
                }));
            }
            drop(result_tx);

            for item in remaining {
                let _ = work_tx.send(item).await;
            }
            drop(work_tx);

            while let Some((idx, result)) = result_rx.recv().await {
                slots[idx] = Some(result);
            }
            for handle in handles {
                let _ = handle.await;
            }
        }

        let results: Vec<ValidationResult> = slots.into_iter().flatten().collect();
        ValidationReport {
            results,
            critical_failures,
            aborted: false,
        }
    }
}

/// Validate one plugin: installed-set lookup, then an integrity check
/// against the catalog checksum when both a registry entry and a local
/// binary exist.
async fn validate_single(
    name: &str,
    critical: bool,
    installed: &HashMap<String, PluginInfo>,
    registry: Option<&PluginRegistry>,
    executables: &ExecutableManager,
    platform_key: &str,
    verification_timeout: Duration,
) -> ValidationResult {
    let Some(registry) = registry else {
        return ValidationResult {
            plugin: name.to_string(),
            critical,
            status: ValidationStatus::RegistryUnavailable,
            message: Some("registry unavailable".to_string()),
        };
    };

    if !installed.contains_key(name) {
        return ValidationResult {
            plugin: name.to_string(),
            critical,
            status: ValidationStatus::Missing,
            message: Some(enhance_error(&format!("plugin '{}' is not installed", name))),
        };
    }

    // Integrity: local binary hash against the catalog checksum.
    if let Some(binary) = registry
        .plugins
        .get(name)
        .and_then(|m| m.binary_for(platform_key))
        .filter(|b| !b.checksum.is_empty())
    {
        let path = executables.plugin_path(name);
        let expected = binary.checksum.to_lowercase();
        let hash_task = tokio::task::spawn_blocking(move || {
            crate::download::verify::sha256_file(&path)
        });
        match tokio::time::timeout(verification_timeout, hash_task).await {
            Ok(Ok(Ok(actual))) => {
                if !actual.eq_ignore_ascii_case(&expected) {
                    return ValidationResult {
                        plugin: name.to_string(),
                        critical,
                        status: ValidationStatus::Failed,
                        message: Some(format!(
                            "integrity check failed: expected {}, actual {}",
                            expected, actual
                        )),
                    };
                }
            }
            Ok(Ok(Err(err))) => {
                return ValidationResult {
                    plugin: name.to_string(),
                    critical,
                    status: ValidationStatus::Failed,
                    message: Some(enhance_error(&format!("integrity check failed: {}", err))),
                };
            }
            Ok(Err(join_err)) => {
                return ValidationResult {
                    plugin: name.to_string(),
                    critical,
                    status: ValidationStatus::Failed,
                    message: Some(format!("integrity check aborted: {}", join_err)),
                };
            }
            Err(_) => {
                return ValidationResult {
                    plugin: name.to_string(),
                    critical,
                    status: ValidationStatus::Failed,
                    message: Some(enhance_error(&format!(
                        "integrity check timed out after {}s",
                        verification_timeout.as_secs()
                    ))),
                };
            }
        }
    }

    ValidationResult {
        plugin: name.to_string(),
        critical,
        status: ValidationStatus::Valid,
        message: None,
    }
}
