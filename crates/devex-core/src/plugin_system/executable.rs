//! Discovery and invocation of installed plugin binaries.
//!
//! Scans the plugin directory for `devex-plugin-*` executables, probes
//! each with `--plugin-info` under a 10 s deadline, and caches the
//! resulting metadata for 30 s with double-checked refresh. Protocol
//! invocations spawn the binary with the sub-command as `argv[1]`, the
//! JSON request on stdin, and a sanitized environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::kernel::constants;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::protocol::{PluginInfo, SetupRequest, SetupResponse};
use crate::security::{blocked_env_vars, safe_get_env, validate_plugin_name};

#[derive(Debug, Default)]
struct MetadataCache {
    plugins: HashMap<String, PluginInfo>,
    refreshed_at: Option<Instant>,
}

/// Manages the on-disk plugin inventory.
#[derive(Debug)]
pub struct ExecutableManager {
    plugin_dir: PathBuf,
    metadata_ttl: Duration,
    cache: RwLock<MetadataCache>,
}

impl ExecutableManager {
    pub fn new(plugin_dir: PathBuf) -> Self {
        Self {
            plugin_dir,
            metadata_ttl: Duration::from_secs(constants::PLUGIN_METADATA_TTL_SECS),
            cache: RwLock::new(MetadataCache::default()),
        }
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// On-disk path for a plugin binary.
    pub fn plugin_path(&self, name: &str) -> PathBuf {
        self.plugin_dir.join(format!(
            "{}{}{}",
            constants::PLUGIN_PREFIX,
            name,
            std::env::consts::EXE_SUFFIX
        ))
    }

    /// Timeout for setup protocol invocations, from
    /// `DEVEX_PLUGIN_TIMEOUT` (seconds) when set.
    pub fn plugin_timeout() -> Duration {
        let raw = safe_get_env(constants::ENV_PLUGIN_TIMEOUT)
            .ok()
            .flatten()
            .unwrap_or_default();
        match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(constants::DEFAULT_PLUGIN_TIMEOUT_SECS),
        }
    }

    /// Plugin names and binary paths present in the plugin directory.
    fn scan_dir(&self) -> Vec<(String, PathBuf)> {
        let entries = match std::fs::read_dir(&self.plugin_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut found = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            let Some(stem) = file_name.strip_prefix(constants::PLUGIN_PREFIX) else {
                continue;
            };
            let name = if cfg!(windows) {
                match stem.strip_suffix(".exe") {
                    Some(n) => n,
                    None => continue,
                }
            } else {
                stem
            };
            if !name.is_empty() {
                found.push((name.to_string(), path));
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }

    /// Probe one binary for its `PluginInfo`. Failures degrade to a
    /// synthetic entry so broken plugins still show up in listings.
    async fn probe(&self, name: &str, path: &Path) -> PluginInfo {
        let probe = async {
            let output = Command::new(path)
                .arg("--plugin-info")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await?;
            if !output.status.success() {
                return Err(std::io::Error::other(format!(
                    "--plugin-info exited with {:?}",
                    output.status.code()
                )));
            }
            serde_json::from_slice::<PluginInfo>(&output.stdout)
                .map_err(|e| std::io::Error::other(e.to_string()))
        };
        let deadline = Duration::from_secs(constants::PLUGIN_INFO_TIMEOUT_SECS);
        match tokio::time::timeout(deadline, probe).await {
            Ok(Ok(info)) => info,
            Ok(Err(err)) => {
                log::warn!("Plugin {} failed --plugin-info probe: {}", name, err);
                PluginInfo::unknown(name)
            }
            Err(_) => {
                log::warn!("Plugin {} --plugin-info probe timed out", name);
                PluginInfo::unknown(name)
            }
        }
    }

    /// List installed plugins with their metadata. Returns a defensive
    /// copy; callers may mutate freely.
    pub async fn list_plugins(&self) -> HashMap<String, PluginInfo> {
        // Fast path under the read lock.
        if let Ok(cache) = self.cache.read() {
            if let Some(at) = cache.refreshed_at {
                if at.elapsed() < self.metadata_ttl {
                    return cache.plugins.clone();
                }
            }
        }

        let scan_started = Instant::now();
        let mut fresh = HashMap::new();
        for (name, path) in self.scan_dir() {
            let info = self.probe(&name, &path).await;
            fresh.insert(name, info);
        }

        // Double-checked: another refresher may have finished while this
        // one was probing.
        if let Ok(mut cache) = self.cache.write() {
            match cache.refreshed_at {
                Some(at) if at > scan_started => return cache.plugins.clone(),
                _ => {
                    cache.plugins = fresh.clone();
                    cache.refreshed_at = Some(Instant::now());
                }
            }
        }
        fresh
    }

    pub async fn is_installed(&self, name: &str) -> bool {
        self.plugin_path(name).is_file()
    }

    fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.refreshed_at = None;
            cache.plugins.clear();
        }
    }

    /// Copy a binary into the plugin directory under the canonical name.
    pub fn install_plugin(&self, source: &Path, name: &str) -> Result<PathBuf, PluginSystemError> {
        validate_plugin_name(name)?;
        let target = self.plugin_path(name);
        std::fs::create_dir_all(&self.plugin_dir).map_err(|source| PluginSystemError::Io {
            plugin: name.to_string(),
            source,
        })?;
        std::fs::copy(source, &target).map_err(|source| PluginSystemError::Io {
            plugin: name.to_string(),
            source,
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).map_err(
                |source| PluginSystemError::Io {
                    plugin: name.to_string(),
                    source,
                },
            )?;
        }
        self.invalidate();
        Ok(target)
    }

    /// Delete an installed plugin binary.
    pub fn remove_plugin(&self, name: &str) -> Result<(), PluginSystemError> {
        validate_plugin_name(name)?;
        let path = self.plugin_path(name);
        if !path.exists() {
            return Err(PluginSystemError::NotInstalled {
                plugin: name.to_string(),
            });
        }
        std::fs::remove_file(&path).map_err(|source| PluginSystemError::Io {
            plugin: name.to_string(),
            source,
        })?;
        self.invalidate();
        Ok(())
    }

    fn sanitized_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(path);
        for var in blocked_env_vars() {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Run a plugin with inherited stdio, e.g. for direct CLI passthrough.
    pub async fn execute_plugin(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<(), PluginSystemError> {
        validate_plugin_name(name)?;
        let path = self.plugin_path(name);
        if !path.is_file() {
            return Err(PluginSystemError::NotInstalled {
                plugin: name.to_string(),
            });
        }

        let status = self
            .sanitized_command(&path)
            .args(args)
            .status()
            .await
            .map_err(|source| PluginSystemError::Launch {
                plugin: name.to_string(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(PluginSystemError::ExitFailure {
                plugin: name.to_string(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }

    /// Invoke a plugin over the setup protocol: `<binary> <command>` with
    /// the request envelope on stdin, response parsed from stdout.
    /// Non-JSON stdout is treated as plain-text log output with success.
    pub async fn run_protocol(
        &self,
        name: &str,
        command: &str,
        request: &SetupRequest,
    ) -> Result<SetupResponse, PluginSystemError> {
        validate_plugin_name(name)?;
        let path = self.plugin_path(name);
        if !path.is_file() {
            return Err(PluginSystemError::NotInstalled {
                plugin: name.to_string(),
            });
        }

        let payload =
            serde_json::to_vec(request).map_err(|e| PluginSystemError::MalformedEnvelope {
                plugin: name.to_string(),
                reason: format!("request serialization failed: {}", e),
            })?;

        let mut child = self
            .sanitized_command(&path)
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PluginSystemError::Launch {
                plugin: name.to_string(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|source| PluginSystemError::Io {
                    plugin: name.to_string(),
                    source,
                })?;
            // Dropping stdin closes the pipe so the plugin sees EOF.
        }

        let deadline = Self::plugin_timeout();
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| PluginSystemError::Io {
                plugin: name.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(PluginSystemError::Timeout {
                    plugin: name.to_string(),
                    operation: command.to_string(),
                    seconds: deadline.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(PluginSystemError::ExitFailure {
                plugin: name.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            log::debug!("{} stderr: {}", name, stderr.trim());
        }

        match serde_json::from_str::<SetupResponse>(stdout.trim()) {
            Ok(response) => Ok(response),
            Err(_) => Ok(SetupResponse::plain_text(&stdout)),
        }
    }
}
