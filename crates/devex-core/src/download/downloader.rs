//! Constructs the local plugin inventory from the registry.
//!
//! Fetches plugin binaries for the current platform, verifies checksums
//! (and optionally signatures) while streaming, and installs them
//! atomically under the plugin directory. Registry snapshots persist to
//! `<cache-dir>/registry.json`; when the network is down a stale snapshot
//! is served with a warning.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::download::error::{DownloadError, DownloadFailure, MultiError};
use crate::download::policy::DownloadStrategy;
use crate::download::verify::{sha256_file, SignatureOutcome, SignatureVerifier};
use crate::kernel::constants;
use crate::platform::SystemInfo;
use crate::registry::client::RegistryClient;
use crate::registry::metadata::{PlatformBinary, PluginRegistry};
use crate::security::{safe_get_env_with_default, validate_plugin_name};

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub plugin_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub strategy: DownloadStrategy,
    pub verify_signatures: bool,
    pub public_key_path: Option<PathBuf>,
}

pub struct Downloader {
    registry: Arc<RegistryClient>,
    http: reqwest::Client,
    config: DownloaderConfig,
    verifier: SignatureVerifier,
    system: SystemInfo,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("plugin_dir", &self.config.plugin_dir)
            .field("strategy", &self.config.strategy)
            .finish()
    }
}

impl Downloader {
    pub fn new(
        registry: Arc<RegistryClient>,
        system: SystemInfo,
        config: DownloaderConfig,
    ) -> Result<Self, DownloadError> {
        // Separate client from the registry's: binary downloads must not
        // inherit the short JSON-API timeout.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(constants::DEFAULT_HTTP_TIMEOUT_SECS))
            .user_agent(format!(
                "{}/{}",
                constants::APP_NAME,
                constants::APP_VERSION
            ))
            .build()
            .map_err(|source| DownloadError::Transport {
                name: "<client>".to_string(),
                source,
            })?;
        let verifier = SignatureVerifier::new(config.public_key_path.clone());
        Ok(Self {
            registry,
            http,
            config,
            verifier,
            system,
        })
    }

    /// Final on-disk location for a plugin binary.
    pub fn plugin_path(&self, name: &str) -> PathBuf {
        self.config.plugin_dir.join(format!(
            "{}{}{}",
            constants::PLUGIN_PREFIX,
            name,
            std::env::consts::EXE_SUFFIX
        ))
    }

    fn registry_cache_path(&self) -> PathBuf {
        self.config.cache_dir.join(constants::REGISTRY_CACHE_FILE)
    }

    /// Disk cache freshness window. Development environments refresh
    /// aggressively.
    fn registry_cache_ttl() -> Duration {
        let env = safe_get_env_with_default(constants::ENV_ENVIRONMENT, "");
        match env.as_str() {
            "dev" | "development" => Duration::from_secs(constants::REGISTRY_CACHE_TTL_DEV_SECS),
            _ => Duration::from_secs(constants::REGISTRY_CACHE_TTL_SECS),
        }
    }

    fn read_cached_registry(&self, path: &Path) -> Option<PluginRegistry> {
        let raw = std::fs::read(path).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(registry) => Some(registry),
            Err(err) => {
                log::warn!(
                    "Discarding unreadable registry cache {}: {}",
                    path.display(),
                    err
                );
                None
            }
        }
    }

    /// Fetch the registry, preferring a fresh disk snapshot, then the
    /// network, then a stale snapshot with a warning.
    pub async fn load_registry(&self) -> Result<Arc<PluginRegistry>, DownloadError> {
        let cache_path = self.registry_cache_path();

        let fresh = std::fs::metadata(&cache_path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
            .map(|age| age < Self::registry_cache_ttl())
            .unwrap_or(false);
        if fresh {
            if let Some(registry) = self.read_cached_registry(&cache_path) {
                return Ok(Arc::new(registry));
            }
        }

        match self.registry.get_registry().await {
            Ok(registry) => {
                self.persist_registry(&cache_path, &registry);
                Ok(registry)
            }
            Err(err) => {
                if let Some(stale) = self.read_cached_registry(&cache_path) {
                    log::warn!(
                        "Registry unreachable ({}); serving stale snapshot from {}",
                        err,
                        cache_path.display()
                    );
                    Ok(Arc::new(stale))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    fn persist_registry(&self, path: &Path, registry: &PluginRegistry) {
        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(self.config.cache_dir.as_path())?;
            let raw = serde_json::to_vec_pretty(registry)?;
            std::fs::write(path, raw)
        };
        if let Err(err) = write() {
            // Cache persistence is best-effort; the snapshot in memory is
            // still good.
            log::warn!("Could not persist registry cache to {}: {}", path.display(), err);
        }
    }

    fn select_binary<'r>(
        &self,
        name: &str,
        registry: &'r PluginRegistry,
    ) -> Result<&'r PlatformBinary, DownloadError> {
        let metadata = registry
            .plugins
            .get(name)
            .ok_or_else(|| DownloadError::PluginNotFound {
                name: name.to_string(),
            })?;
        let platform = self.system.platform_key();
        let binary = metadata.binary_for(&platform).ok_or_else(|| {
            DownloadError::PlatformUnavailable {
                name: name.to_string(),
                platform: platform.clone(),
            }
        })?;

        // Reject unreleased catalog entries before any network I/O.
        if !binary.is_installable() {
            let reason = if binary.url.is_empty() {
                "missing download url"
            } else if binary.checksum.is_empty() {
                "missing checksum"
            } else {
                "missing size"
            };
            return Err(DownloadError::IncompleteEntry {
                name: name.to_string(),
                platform,
                reason: reason.to_string(),
            });
        }
        Ok(binary)
    }

    /// Download, verify, and install one plugin. Idempotent: a local
    /// binary whose SHA-256 already matches the catalog is left alone.
    pub async fn download_plugin(&self, name: &str) -> Result<PathBuf, DownloadError> {
        validate_plugin_name(name)?;

        let registry = self.load_registry().await?;
        let binary = self.select_binary(name, &registry)?;
        let final_path = self.plugin_path(name);

        if final_path.exists() {
            match sha256_file(&final_path) {
                Ok(actual) if actual.eq_ignore_ascii_case(&binary.checksum) => {
                    log::debug!("Plugin {} already up to date", name);
                    return Ok(final_path);
                }
                Ok(_) => log::info!("Plugin {} is outdated, re-downloading", name),
                Err(err) => log::warn!(
                    "Could not hash existing {}: {}; re-downloading",
                    final_path.display(),
                    err
                ),
            }
        }

        std::fs::create_dir_all(&self.config.plugin_dir).map_err(|source| DownloadError::Io {
            name: name.to_string(),
            source,
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(
                &self.config.plugin_dir,
                std::fs::Permissions::from_mode(0o755),
            );
        }

        let tmp = self.stream_to_temp(name, binary).await?;

        if self.config.verify_signatures {
            self.verify_signature(name, &binary.url, tmp.path()).await?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o755)).map_err(
                |source| DownloadError::Io {
                    name: name.to_string(),
                    source,
                },
            )?;
        }

        tmp.persist(&final_path)
            .map_err(|err| DownloadError::Io {
                name: name.to_string(),
                source: err.error,
            })?;
        log::info!("Installed plugin {} to {}", name, final_path.display());
        Ok(final_path)
    }

    /// Stream the binary into a temp file in the target directory while
    /// hashing. Checksum mismatch drops the temp file and fails hard.
    async fn stream_to_temp(
        &self,
        name: &str,
        binary: &PlatformBinary,
    ) -> Result<tempfile::NamedTempFile, DownloadError> {
        use sha2::{Digest, Sha256};

        let transport = |source: reqwest::Error| DownloadError::Transport {
            name: name.to_string(),
            source,
        };
        let io = |source: std::io::Error| DownloadError::Io {
            name: name.to_string(),
            source,
        };

        let mut response = self
            .http
            .get(&binary.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".devex-download-")
            .tempfile_in(&self.config.plugin_dir)
            .map_err(io)?;
        let mut hasher = Sha256::new();
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            hasher.update(&chunk);
            tmp.write_all(&chunk).map_err(io)?;
        }
        tmp.flush().map_err(io)?;

        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(&binary.checksum) {
            // NamedTempFile removes itself on drop, so the partial
            // download never reaches the plugin directory.
            return Err(DownloadError::ChecksumMismatch {
                name: name.to_string(),
                expected: binary.checksum.to_lowercase(),
                actual,
            });
        }
        Ok(tmp)
    }

    async fn verify_signature(
        &self,
        name: &str,
        url: &str,
        data_path: &Path,
    ) -> Result<(), DownloadError> {
        if self.config.public_key_path.is_none() {
            log::warn!(
                "No public key configured; skipping signature verification for {}",
                name
            );
            return Ok(());
        }

        let sig_url = format!("{}.sig", url);
        let signature = self
            .http
            .get(&sig_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| DownloadError::SignatureInvalid {
                name: name.to_string(),
                reason: format!("signature file unavailable: {}", source),
            })?
            .bytes()
            .await
            .map_err(|source| DownloadError::Transport {
                name: name.to_string(),
                source,
            })?;

        match self.verifier.verify(name, data_path, &signature).await? {
            SignatureOutcome::Verified => Ok(()),
            SignatureOutcome::SkippedNoKey | SignatureOutcome::SkippedNoVerifier => {
                log::warn!("Signature for {} not verified (no usable verifier)", name);
                Ok(())
            }
        }
    }

    /// Download a list of plugins under the configured strategy. The `Ok`
    /// value carries any non-fatal failures.
    pub async fn download_required(
        &self,
        names: &[String],
        critical: &HashSet<String>,
    ) -> Result<MultiError, DownloadError> {
        let mut failures = Vec::new();
        for name in names {
            match self.download_plugin(name).await {
                Ok(_) => {}
                Err(err) => match self.config.strategy {
                    DownloadStrategy::FailOnError => return Err(err),
                    DownloadStrategy::RequireCritical if critical.contains(name) => {
                        return Err(err)
                    }
                    _ => {
                        log::error!("Plugin {} download failed: {}", name, err);
                        failures.push(DownloadFailure {
                            plugin: name.clone(),
                            error: err,
                        });
                    }
                },
            }
        }

        let multi = MultiError { failures };
        if !multi.is_empty() {
            log::warn!("{}", multi);
        }
        Ok(multi)
    }
}
