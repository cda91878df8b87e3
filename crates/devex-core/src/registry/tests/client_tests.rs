use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::registry::client::{RegistryClient, RegistryClientConfig};
use crate::registry::error::RegistryError;

fn client_for(server: &MockServer) -> RegistryClient {
    let config = RegistryClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    };
    RegistryClient::new(config).expect("client")
}

fn registry_body() -> serde_json::Value {
    serde_json::json!({
        "base_url": "https://registry.devex.sh",
        "version": "1",
        "last_updated": "2025-06-01T12:00:00Z",
        "plugins": {
            "tool-shell": {
                "name": "tool-shell",
                "version": "2.1.0",
                "description": "Shell configuration",
                "tags": ["tool"],
                "platforms": {}
            },
            "tool-git": {
                "name": "tool-git",
                "version": "1.0.0",
                "description": "Git identity setup",
                "tags": ["tool"],
                "platforms": {}
            }
        }
    })
}

#[tokio::test]
async fn get_registry_parses_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(registry_body()))
        .expect(1) // second call must come from cache
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.get_registry().await.expect("first fetch");
    assert_eq!(first.plugins.len(), 2);

    let second = client.get_registry().await.expect("cached fetch");
    assert_eq!(second.plugins.len(), 2);
}

#[tokio::test]
async fn registry_error_body_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/registry"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "registry maintenance"
            })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.get_registry().await {
        Err(RegistryError::Http { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "registry maintenance");
        }
        other => panic!("expected Http error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn non_json_error_body_is_used_raw() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/registry"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.get_registry().await {
        Err(RegistryError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Http error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn get_plugin_validates_name_before_any_io() {
    let server = MockServer::start().await;
    // No mock mounted: a request would 404 and fail differently.
    let client = client_for(&server);
    match client.get_plugin("../etc/passwd").await {
        Err(RegistryError::Name(_)) => {}
        other => panic!("expected Name error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn get_plugin_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/plugins/missing-plugin"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.get_plugin("missing-plugin").await {
        Err(RegistryError::PluginNotFound { name }) => assert_eq!(name, "missing-plugin"),
        other => panic!("expected PluginNotFound, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn search_uses_published_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(registry_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let results = client
        .search_plugins("tool-shell", &[], 0)
        .await
        .expect("search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "tool-shell");

    // Exact-name ordering over the shared "tool" substring.
    let all = client.search_plugins("tool", &[], 0).await.expect("search");
    let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["tool-git", "tool-shell"]);
}
