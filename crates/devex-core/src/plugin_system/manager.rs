//! The central plugin system component.
//!
//! `DefaultPluginManager` owns the registry client, downloader, executable
//! manager, validator, and background updater, and exposes the operations
//! the wizard and CLI need: prepare the plugin inventory for a setup run,
//! ensure a single plugin is present (downloading on demand), and shut the
//! subsystem down cleanly.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheMetrics;
use crate::download::downloader::Downloader;
use crate::download::error::MultiError;
use crate::kernel::component::KernelComponent;
use crate::kernel::error::Result;
use crate::platform::SystemInfo;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::executable::ExecutableManager;
use crate::plugin_system::updater::BackgroundUpdater;
use crate::plugin_system::validator::{PluginValidator, ValidationReport};
use crate::registry::client::RegistryClient;

/// Aggregate outcome of preparing the plugin inventory for a setup run.
#[derive(Debug)]
pub struct PluginSystemStatus {
    pub registry_available: bool,
    /// Non-fatal download failures (continue-on-error policy).
    pub download_failures: MultiError,
    pub report: ValidationReport,
    /// Degradation banner for the wizard, when applicable.
    pub banner: Option<String>,
}

impl PluginSystemStatus {
    /// Whether the wizard may treat plugins as installed. Registry outage
    /// counts: post-install steps still run in degraded mode.
    pub fn plugins_installed(&self) -> bool {
        self.report.degraded() || self.report.critical_failures == 0
    }
}

pub struct DefaultPluginManager {
    name: &'static str,
    system: SystemInfo,
    settings: Arc<crate::config::Settings>,
    registry: Arc<RegistryClient>,
    downloader: Arc<Downloader>,
    executables: Arc<ExecutableManager>,
    validator: PluginValidator,
    updater: Arc<BackgroundUpdater>,
    auto_update: bool,
}

impl std::fmt::Debug for DefaultPluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultPluginManager")
            .field("name", &self.name)
            .field("plugin_dir", &self.executables.plugin_dir())
            .finish()
    }
}

impl DefaultPluginManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        system: SystemInfo,
        settings: Arc<crate::config::Settings>,
        registry: Arc<RegistryClient>,
        downloader: Arc<Downloader>,
        executables: Arc<ExecutableManager>,
        validator: PluginValidator,
        updater: Arc<BackgroundUpdater>,
        auto_update: bool,
    ) -> Self {
        Self {
            name: "DefaultPluginManager",
            system,
            settings,
            registry,
            downloader,
            executables,
            validator,
            updater,
            auto_update,
        }
    }

    pub fn registry(&self) -> &Arc<RegistryClient> {
        &self.registry
    }

    pub fn downloader(&self) -> &Arc<Downloader> {
        &self.downloader
    }

    pub fn executables(&self) -> &Arc<ExecutableManager> {
        &self.executables
    }

    pub fn updater(&self) -> &Arc<BackgroundUpdater> {
        &self.updater
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.registry.cache_metrics()
    }

    /// Plugins this platform needs before setup can configure anything.
    pub fn required_plugins(&self) -> Vec<String> {
        let mut required = vec![self.settings.package_manager_plugin(&self.system)];
        if self.system.os != "windows" {
            required.push("tool-shell".to_string());
        }
        required.push("tool-git".to_string());
        if self.system.has_desktop() {
            required.push(format!("desktop-{}", self.system.desktop));
        }
        required
    }

    /// Ensure a plugin is installed, downloading it from the registry
    /// when missing. Returns the binary path.
    pub async fn ensure_plugin(&self, name: &str) -> std::result::Result<PathBuf, PluginSystemError> {
        if self.executables.is_installed(name).await {
            return Ok(self.executables.plugin_path(name));
        }
        log::info!("Plugin {} missing locally; downloading", name);
        let path = self.downloader.download_plugin(name).await?;
        Ok(path)
    }

    /// Prepare the plugin inventory for a setup run: fetch the registry
    /// (tolerating outage), download required plugins, and validate.
    pub async fn prepare(&self, required: &[String]) -> PluginSystemStatus {
        let critical: HashSet<String> = self.validator.resolve_critical_set();

        match self.downloader.load_registry().await {
            Ok(registry) => {
                let download_failures = match self
                    .downloader
                    .download_required(required, &critical)
                    .await
                {
                    Ok(failures) => failures,
                    Err(err) => {
                        // Fatal under the configured policy; surface via a
                        // failed report instead of a banner.
                        log::error!("Required plugin download aborted: {}", err);
                        MultiError {
                            failures: vec![crate::download::error::DownloadFailure {
                                plugin: "<batch>".to_string(),
                                error: err,
                            }],
                        }
                    }
                };
                let report = self.validator.validate(required, Some(registry)).await;
                PluginSystemStatus {
                    registry_available: true,
                    download_failures,
                    report,
                    banner: None,
                }
            }
            Err(err) => {
                log::warn!("Plugin registry unavailable: {}", err);
                let report = self.validator.validate(required, None).await;
                PluginSystemStatus {
                    registry_available: false,
                    download_failures: MultiError::default(),
                    report,
                    banner: Some("Plugin system initialized (registry unavailable)".to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl KernelComponent for DefaultPluginManager {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(self.executables.plugin_dir())
            .map_err(|e| crate::kernel::error::Error::io(e, "create plugin directory"))?;
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        if self.auto_update {
            self.updater.start().await;
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.updater.stop().await;
        self.registry.close();
        Ok(())
    }
}
