use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tempfile::tempdir;
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::download::downloader::{Downloader, DownloaderConfig};
use crate::download::policy::DownloadStrategy;
use crate::platform::SystemInfo;
use crate::plugin_system::executable::ExecutableManager;
use crate::plugin_system::tests::common;
use crate::plugin_system::updater::{BackgroundUpdater, UpdateStatus, DEFAULT_UPDATE_INTERVAL};
use crate::registry::client::{RegistryClient, RegistryClientConfig};

const NEW_BINARY: &[u8] = b"#!/bin/sh\necho updated\n";

fn test_system() -> SystemInfo {
    SystemInfo {
        os: "linux".to_string(),
        distribution: "debian".to_string(),
        desktop: "gnome".to_string(),
        arch: "amd64".to_string(),
    }
}

fn seed_registry_cache(cache_dir: &std::path::Path, url: &str) {
    let registry = serde_json::json!({
        "version": "1",
        "last_updated": "2025-06-01T12:00:00Z",
        "plugins": {
            "tool-shell": {
                "name": "tool-shell",
                "version": "2.0.0",
                "platforms": {
                    "linux-amd64": {
                        "url": url,
                        "checksum": hex::encode(Sha256::digest(NEW_BINARY)),
                        "size": NEW_BINARY.len(),
                        "os": "linux",
                        "arch": "amd64"
                    }
                }
            }
        }
    });
    std::fs::create_dir_all(cache_dir).expect("cache dir");
    std::fs::write(
        cache_dir.join("registry.json"),
        serde_json::to_vec(&registry).expect("json"),
    )
    .expect("write");
}

fn build_updater(
    server: &MockServer,
    plugin_dir: &std::path::Path,
    cache_dir: &std::path::Path,
) -> Arc<BackgroundUpdater> {
    let client = Arc::new(
        RegistryClient::new(RegistryClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .expect("client"),
    );
    let downloader = Arc::new(
        Downloader::new(
            client,
            test_system(),
            DownloaderConfig {
                plugin_dir: plugin_dir.to_path_buf(),
                cache_dir: cache_dir.to_path_buf(),
                strategy: DownloadStrategy::default(),
                verify_signatures: false,
                public_key_path: None,
            },
        )
        .expect("downloader"),
    );
    let executables = Arc::new(ExecutableManager::new(plugin_dir.to_path_buf()));
    Arc::new(BackgroundUpdater::new(
        downloader,
        executables,
        DEFAULT_UPDATE_INTERVAL,
    ))
}

#[tokio::test]
async fn version_diff_triggers_download_and_callback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bin/tool-shell"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(NEW_BINARY))
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let plugin_dir = dir.path().join("plugins");
    let cache_dir = dir.path().join("cache");
    // Installed at 1.0.0; catalog advertises 2.0.0.
    common::write_plugin(&plugin_dir, "tool-shell", "1.0.0");
    seed_registry_cache(&cache_dir, &format!("{}/bin/tool-shell", server.uri()));

    let updater = build_updater(&server, &plugin_dir, &cache_dir);
    let seen: Arc<Mutex<Vec<UpdateStatus>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    updater
        .on_update(Arc::new(move |status: &UpdateStatus| {
            let sink = sink.clone();
            let status = status.clone();
            // Callback runs synchronously; record via try_lock to stay
            // non-blocking.
            if let Ok(mut guard) = sink.try_lock() {
                guard.push(status);
            };
        }))
        .await;

    updater.run_once().await;

    let statuses = seen.lock().await;
    assert_eq!(statuses.len(), 1);
    let status = &statuses[0];
    assert_eq!(status.plugin, "tool-shell");
    assert_eq!(status.old_version, "1.0.0");
    assert_eq!(status.new_version, "2.0.0");
    assert!(status.success, "update failed: {:?}", status.error);

    // Binary was replaced with the catalog version.
    let installed = std::fs::read(plugin_dir.join("devex-plugin-tool-shell")).expect("read");
    assert_eq!(installed, NEW_BINARY);
}

#[tokio::test]
async fn matching_versions_are_left_alone() {
    let server = MockServer::start().await;
    let counter = Arc::new(AtomicUsize::new(0));
    let dir = tempdir().expect("tempdir");
    let plugin_dir = dir.path().join("plugins");
    let cache_dir = dir.path().join("cache");
    common::write_plugin(&plugin_dir, "tool-shell", "2.0.0");
    seed_registry_cache(&cache_dir, &format!("{}/bin/tool-shell", server.uri()));

    let updater = build_updater(&server, &plugin_dir, &cache_dir);
    let hits = counter.clone();
    updater
        .on_update(Arc::new(move |_: &UpdateStatus| {
            hits.fetch_add(1, Ordering::SeqCst);
        }))
        .await;

    updater.run_once().await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stop_is_idempotent_and_restartable() {
    let server = MockServer::start().await;
    let dir = tempdir().expect("tempdir");
    let plugin_dir = dir.path().join("plugins");
    let cache_dir = dir.path().join("cache");
    seed_registry_cache(&cache_dir, "https://unused");

    let updater = build_updater(&server, &plugin_dir, &cache_dir);
    assert!(!updater.is_running().await);

    updater.start().await;
    assert!(updater.is_running().await);

    updater.stop().await;
    updater.stop().await; // second stop is a no-op
    assert!(!updater.is_running().await);

    updater.start().await;
    assert!(updater.is_running().await);
    updater.stop().await;
}
