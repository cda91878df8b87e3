//! Background plugin updater.
//!
//! A background task polls the registry on a clamped interval, compares
//! every installed plugin's version against the catalog, and downloads any
//! plugin whose version differs. Each attempt fans out an [`UpdateStatus`]
//! to every registered callback. `stop()` is idempotent and leaves the
//! updater restartable.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};

use crate::download::downloader::Downloader;
use crate::plugin_system::executable::ExecutableManager;

/// Interval bounds: at least hourly, at most weekly.
const MIN_INTERVAL: Duration = Duration::from_secs(60 * 60);
const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Default: daily.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Result of one update attempt, delivered to callbacks.
#[derive(Debug, Clone)]
pub struct UpdateStatus {
    pub plugin: String,
    pub old_version: String,
    pub new_version: String,
    pub success: bool,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

pub type UpdateCallback = Arc<dyn Fn(&UpdateStatus) + Send + Sync>;

pub struct BackgroundUpdater {
    downloader: Arc<Downloader>,
    executables: Arc<ExecutableManager>,
    interval: Duration,
    callbacks: Mutex<Vec<UpdateCallback>>,
    running: Mutex<bool>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl std::fmt::Debug for BackgroundUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundUpdater")
            .field("interval", &self.interval)
            .finish()
    }
}

impl BackgroundUpdater {
    pub fn new(
        downloader: Arc<Downloader>,
        executables: Arc<ExecutableManager>,
        interval: Duration,
    ) -> Self {
        let clamped = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        if clamped != interval {
            log::warn!(
                "Update interval {:?} clamped to {:?}",
                interval,
                clamped
            );
        }
        Self {
            downloader,
            executables,
            interval: clamped,
            callbacks: Mutex::new(Vec::new()),
            running: Mutex::new(false),
            stop_tx: Mutex::new(None),
        }
    }

    /// Register a callback for update attempts.
    pub async fn on_update(&self, callback: UpdateCallback) {
        self.callbacks.lock().await.push(callback);
    }

    pub async fn is_running(&self) -> bool {
        *self.running.lock().await
    }

    /// Start the updater. An initial pass runs once before the ticker.
    /// Starting an already running updater is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut running = self.running.lock().await;
        if *running {
            return;
        }
        *running = true;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *self.stop_tx.lock().await = Some(stop_tx);

        let updater = self.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            updater.run_once().await;
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                tokio::select! {
                    _ = ticker.tick() => updater.run_once().await,
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            // The running flag is owned by start/stop; a restart may
            // already have flipped it back on by the time this task ends.
        });
    }

    /// Stop the updater. Idempotent; a fresh stop channel is created on
    /// the next `start`, so the updater remains restartable.
    pub async fn stop(&self) {
        if let Some(stop_tx) = self.stop_tx.lock().await.take() {
            let _ = stop_tx.send(true);
        }
        *self.running.lock().await = false;
    }

    /// One update pass: diff installed versions against the catalog and
    /// download what changed. Errors are non-fatal and reported through
    /// callbacks only.
    pub async fn run_once(&self) {
        let registry = match self.downloader.load_registry().await {
            Ok(registry) => registry,
            Err(err) => {
                log::debug!("Update pass skipped, registry unavailable: {}", err);
                return;
            }
        };

        let installed = self.executables.list_plugins().await;
        for (name, info) in installed {
            let Some(catalog) = registry.plugins.get(&name) else {
                continue;
            };
            if catalog.version.is_empty() || catalog.version == info.version {
                continue;
            }

            log::info!(
                "Updating plugin {} from {} to {}",
                name,
                info.version,
                catalog.version
            );
            let outcome = self.downloader.download_plugin(&name).await;
            let status = UpdateStatus {
                plugin: name.clone(),
                old_version: info.version.clone(),
                new_version: catalog.version.clone(),
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.to_string()),
                at: Utc::now(),
            };
            self.notify(&status).await;
        }
    }

    async fn notify(&self, status: &UpdateStatus) {
        let callbacks = self.callbacks.lock().await;
        for callback in callbacks.iter() {
            callback(status);
        }
    }
}
