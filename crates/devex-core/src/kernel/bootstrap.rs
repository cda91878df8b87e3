//! Application bootstrap: builds every subsystem, registers kernel
//! components, and runs their lifecycle in a fixed order.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::paths;
use crate::config::settings::Settings;
use crate::download::downloader::{Downloader, DownloaderConfig};
use crate::download::policy::DownloadStrategy;
use crate::kernel::component::{ComponentRegistry, KernelComponent};
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::platform::SystemInfo;
use crate::plugin_system::executable::ExecutableManager;
use crate::plugin_system::manager::{DefaultPluginManager, PluginSystemStatus};
use crate::plugin_system::updater::{BackgroundUpdater, DEFAULT_UPDATE_INTERVAL};
use crate::plugin_system::validator::{PluginValidator, ValidatorConfig};
use crate::registry::client::{RegistryClient, RegistryClientConfig};
use crate::setup::actions::ActionExecutor;
use crate::setup::executor::SetupExecutor;
use crate::wizard::model::WizardModel;
use crate::wizard::steps::default_config;

/// Construction-time knobs, typically from CLI flags.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub registry_url: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub plugin_dir: Option<PathBuf>,
    pub download_strategy: DownloadStrategy,
    pub verify_signatures: bool,
    pub public_key_path: Option<PathBuf>,
    pub auto_update: bool,
    pub fail_on_critical: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            registry_url: None,
            config_dir: None,
            cache_dir: None,
            plugin_dir: None,
            download_strategy: DownloadStrategy::default(),
            verify_signatures: false,
            public_key_path: None,
            auto_update: false,
            fail_on_critical: false,
        }
    }
}

/// Everything an interactive or non-interactive setup run needs.
pub struct SetupSession {
    pub status: PluginSystemStatus,
    pub model: WizardModel,
    pub actions: ActionExecutor,
}

/// Main application struct owning the subsystems and driving their
/// lifecycle through the component registry.
pub struct Application {
    system: SystemInfo,
    settings: Arc<Settings>,
    config_root: PathBuf,
    initialized: bool,
    components: Arc<Mutex<ComponentRegistry>>,
    plugin_manager: Arc<DefaultPluginManager>,
}

impl Application {
    /// Create the application with default components. Must be called
    /// within a tokio runtime (caches and updaters spawn tasks).
    pub fn new(options: AppOptions) -> Result<Self> {
        log::info!(
            "Initializing {} v{}",
            constants::APP_NAME,
            constants::APP_VERSION
        );

        let system = SystemInfo::detect();
        let config_root = options.config_dir.unwrap_or_else(paths::config_dir);
        let cache_dir = options.cache_dir.unwrap_or_else(paths::cache_dir);
        let plugin_dir = options.plugin_dir.unwrap_or_else(paths::plugin_dir);
        log::info!("Using config directory: {}", config_root.display());
        log::info!("Using plugin directory: {}", plugin_dir.display());

        let settings = Arc::new(Settings::load(&config_root)?);

        let registry = Arc::new(RegistryClient::new(RegistryClientConfig {
            base_url: options
                .registry_url
                .unwrap_or_else(|| constants::DEFAULT_REGISTRY_URL.to_string()),
            ..Default::default()
        })?);
        let downloader = Arc::new(Downloader::new(
            registry.clone(),
            system.clone(),
            DownloaderConfig {
                plugin_dir: plugin_dir.clone(),
                cache_dir,
                strategy: options.download_strategy,
                verify_signatures: options.verify_signatures,
                public_key_path: options.public_key_path,
            },
        )?);
        let executables = Arc::new(ExecutableManager::new(plugin_dir));
        let validator = PluginValidator::new(
            executables.clone(),
            system.clone(),
            settings.critical_plugins.clone(),
            ValidatorConfig {
                fail_on_critical: options.fail_on_critical,
                ..Default::default()
            },
        );
        let updater = Arc::new(BackgroundUpdater::new(
            downloader.clone(),
            executables.clone(),
            DEFAULT_UPDATE_INTERVAL,
        ));
        let plugin_manager = Arc::new(DefaultPluginManager::new(
            system.clone(),
            settings.clone(),
            registry,
            downloader,
            executables,
            validator,
            updater,
            options.auto_update,
        ));

        let mut components = ComponentRegistry::new();
        components.register(plugin_manager.clone());

        Ok(Application {
            system,
            settings,
            config_root,
            initialized: false,
            components: Arc::new(Mutex::new(components)),
            plugin_manager,
        })
    }

    pub fn system(&self) -> &SystemInfo {
        &self.system
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn plugin_manager(&self) -> &Arc<DefaultPluginManager> {
        &self.plugin_manager
    }

    fn lifecycle_error(
        phase: KernelLifecyclePhase,
        component: &Arc<dyn KernelComponent>,
        err: Error,
    ) -> Error {
        Error::KernelLifecycleError {
            phase,
            component_name: Some(component.name().to_string()),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Initialize and start all registered components in order.
    pub async fn startup(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::RunPreCheck,
                component_name: None,
                message: "Application already initialized".to_string(),
                source: None,
            });
        }

        let registry = self.components.lock().await;
        for component in registry.in_startup_order() {
            component.initialize().await.map_err(|err| {
                Self::lifecycle_error(KernelLifecyclePhase::Initialize, component, err)
            })?;
        }
        for component in registry.in_startup_order() {
            component
                .start()
                .await
                .map_err(|err| Self::lifecycle_error(KernelLifecyclePhase::Start, component, err))?;
        }
        drop(registry);

        self.initialized = true;
        log::info!("Application initialized and started successfully.");
        Ok(())
    }

    /// Stop all components, tolerating individual failures.
    pub async fn shutdown(&mut self) -> Result<()> {
        let registry = self.components.lock().await;
        for component in registry.in_shutdown_order() {
            if let Err(err) = component.stop().await {
                log::warn!("Component {} failed to stop: {}", component.name(), err);
            }
        }
        self.initialized = false;
        Ok(())
    }

    /// Prepare a full setup run: plugin inventory first, then the wizard
    /// model over the default workflow.
    pub async fn prepare_setup(&self, dry_run: bool) -> Result<SetupSession> {
        let required = self.plugin_manager.required_plugins();
        log::info!("Required plugins: {}", required.join(", "));
        let status = self.plugin_manager.prepare(&required).await;

        let config = default_config(&self.settings);
        let allow_execute = config.allow_execute;
        let executor = SetupExecutor::new(
            config,
            self.system.clone(),
            self.settings.clone(),
            self.config_root.clone(),
        );
        let mut model = WizardModel::new(executor).map_err(Error::Setup)?;

        model.set_banner(status.banner.clone());
        model.set_plugins_installed(status.plugins_installed());
        for failure in &status.download_failures.failures {
            model.push_error(format!("{}: {}", failure.plugin, failure.error));
        }
        for result in &status.report.results {
            if !result.ok() {
                if let Some(message) = &result.message {
                    model.push_error(format!("{}: {}", result.plugin, message));
                }
            }
        }

        let actions = ActionExecutor::new(
            self.plugin_manager.clone(),
            self.settings.clone(),
            self.system.clone(),
            self.config_root.clone(),
            allow_execute,
            dry_run,
        );

        Ok(SetupSession {
            status,
            model,
            actions,
        })
    }
}
