use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::download::downloader::{Downloader, DownloaderConfig};
use crate::download::error::DownloadError;
use crate::download::policy::DownloadStrategy;
use crate::platform::SystemInfo;
use crate::registry::client::{RegistryClient, RegistryClientConfig};

const PAYLOAD: &[u8] = b"#!/bin/sh\necho plugin\n";

fn payload_checksum() -> String {
    hex::encode(Sha256::digest(PAYLOAD))
}

fn test_system() -> SystemInfo {
    SystemInfo {
        os: "linux".to_string(),
        distribution: "debian".to_string(),
        desktop: "gnome".to_string(),
        arch: "amd64".to_string(),
    }
}

/// Seed a fresh registry snapshot on disk so tests exercise the
/// downloader without registry HTTP traffic.
fn seed_registry_cache(cache_dir: &Path, name: &str, url: &str, checksum: &str) {
    let registry = serde_json::json!({
        "base_url": "https://registry.devex.sh",
        "version": "1",
        "last_updated": "2025-06-01T12:00:00Z",
        "plugins": {
            name: {
                "name": name,
                "version": "1.0.0",
                "description": "test plugin",
                "platforms": {
                    "linux-amd64": {
                        "url": url,
                        "checksum": checksum,
                        "size": PAYLOAD.len(),
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
        serde_json::to_vec_pretty(&registry).expect("serialize"),
    )
    .expect("write cache");
}

fn downloader(
    server: &MockServer,
    plugin_dir: &Path,
    cache_dir: &Path,
    strategy: DownloadStrategy,
) -> Downloader {
    let client = RegistryClient::new(RegistryClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .expect("client");
    Downloader::new(
        Arc::new(client),
        test_system(),
        DownloaderConfig {
            plugin_dir: plugin_dir.to_path_buf(),
            cache_dir: cache_dir.to_path_buf(),
            strategy,
            verify_signatures: false,
            public_key_path: None,
        },
    )
    .expect("downloader")
}

#[tokio::test]
async fn download_installs_and_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bin/tool-shell"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD))
        .expect(1) // second download must hit the local checksum short-circuit
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let plugin_dir = dir.path().join("plugins");
    let cache_dir = dir.path().join("cache");
    seed_registry_cache(
        &cache_dir,
        "tool-shell",
        &format!("{}/bin/tool-shell", server.uri()),
        &payload_checksum(),
    );

    let downloader = downloader(&server, &plugin_dir, &cache_dir, DownloadStrategy::default());
    let installed = downloader.download_plugin("tool-shell").await.expect("download");
    assert_eq!(installed, plugin_dir.join("devex-plugin-tool-shell"));
    assert_eq!(std::fs::read(&installed).expect("read"), PAYLOAD);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&installed).expect("meta").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    // Second call: catalog checksum matches the local file, no network.
    downloader.download_plugin("tool-shell").await.expect("idempotent");
}

#[tokio::test]
async fn checksum_mismatch_deletes_partial_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bin/tool-shell"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered bytes".as_slice()))
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let plugin_dir = dir.path().join("plugins");
    let cache_dir = dir.path().join("cache");
    let expected = payload_checksum();
    seed_registry_cache(
        &cache_dir,
        "tool-shell",
        &format!("{}/bin/tool-shell", server.uri()),
        &expected,
    );

    let downloader = downloader(&server, &plugin_dir, &cache_dir, DownloadStrategy::default());
    match downloader.download_plugin("tool-shell").await {
        Err(DownloadError::ChecksumMismatch {
            name,
            expected: exp,
            actual,
        }) => {
            assert_eq!(name, "tool-shell");
            assert_eq!(exp, expected);
            assert_eq!(actual, hex::encode(Sha256::digest(b"tampered bytes")));
        }
        other => panic!("expected ChecksumMismatch, got {:?}", other.map(|_| ())),
    }

    // Neither the final binary nor any temp file may remain.
    assert!(!plugin_dir.join("devex-plugin-tool-shell").exists());
    let leftovers: Vec<_> = std::fs::read_dir(&plugin_dir)
        .expect("read dir")
        .collect();
    assert!(leftovers.is_empty(), "partial download left behind");
}

#[tokio::test]
async fn incomplete_catalog_entry_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bin/tool-shell"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let plugin_dir = dir.path().join("plugins");
    let cache_dir = dir.path().join("cache");
    // Empty checksum marks an unreleased build.
    seed_registry_cache(
        &cache_dir,
        "tool-shell",
        &format!("{}/bin/tool-shell", server.uri()),
        "",
    );

    let downloader = downloader(&server, &plugin_dir, &cache_dir, DownloadStrategy::default());
    match downloader.download_plugin("tool-shell").await {
        Err(DownloadError::IncompleteEntry { reason, .. }) => {
            assert!(reason.contains("checksum"));
        }
        other => panic!("expected IncompleteEntry, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn platform_unavailable_is_reported() {
    let server = MockServer::start().await;
    let dir = tempdir().expect("tempdir");
    let cache_dir = dir.path().join("cache");

    let registry = serde_json::json!({
        "plugins": {
            "mac-only": {
                "name": "mac-only",
                "version": "1.0.0",
                "platforms": {
                    "darwin-arm64": {
                        "url": "https://cdn.devex.sh/mac-only",
                        "checksum": "ab",
                        "size": 1
                    }
                }
            }
        }
    });
    std::fs::create_dir_all(&cache_dir).expect("dir");
    std::fs::write(
        cache_dir.join("registry.json"),
        serde_json::to_vec(&registry).expect("json"),
    )
    .expect("write");

    let downloader = downloader(
        &server,
        &dir.path().join("plugins"),
        &cache_dir,
        DownloadStrategy::default(),
    );
    match downloader.download_plugin("mac-only").await {
        Err(DownloadError::PlatformUnavailable { platform, .. }) => {
            assert_eq!(platform, "linux-amd64");
        }
        other => panic!("expected PlatformUnavailable, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn continue_on_error_collects_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bin/tool-shell"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD))
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let plugin_dir = dir.path().join("plugins");
    let cache_dir = dir.path().join("cache");
    seed_registry_cache(
        &cache_dir,
        "tool-shell",
        &format!("{}/bin/tool-shell", server.uri()),
        &payload_checksum(),
    );

    let downloader = downloader(&server, &plugin_dir, &cache_dir, DownloadStrategy::ContinueOnError);
    let names = vec!["tool-shell".to_string(), "absent-plugin".to_string()];
    let failures = downloader
        .download_required(&names, &HashSet::new())
        .await
        .expect("continue-on-error returns ok");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures.failures[0].plugin, "absent-plugin");
    assert!(plugin_dir.join("devex-plugin-tool-shell").exists());
}

#[tokio::test]
async fn require_critical_aborts_on_critical_failure() {
    let server = MockServer::start().await;
    let dir = tempdir().expect("tempdir");
    let cache_dir = dir.path().join("cache");
    seed_registry_cache(&cache_dir, "other", "https://unused", "ab");

    let downloader = downloader(
        &server,
        &dir.path().join("plugins"),
        &cache_dir,
        DownloadStrategy::RequireCritical,
    );

    let critical: HashSet<String> = ["tool-shell".to_string()].into_iter().collect();
    let names = vec!["tool-shell".to_string()];
    assert!(downloader.download_required(&names, &critical).await.is_err());

    // The same failure for a non-critical plugin is tolerated.
    let failures = downloader
        .download_required(&names, &HashSet::new())
        .await
        .expect("non-critical failure tolerated");
    assert_eq!(failures.len(), 1);
}
