use std::collections::HashMap;

use serde_json::json;

use crate::platform::SystemInfo;
use crate::plugin_system::protocol::{
    EnvironmentInfo, PluginInfo, SetupRequest, SetupResponse, SetupStatus,
};

#[test]
fn request_serializes_with_snake_case_environment() {
    let system = SystemInfo {
        os: "linux".to_string(),
        distribution: "debian".to_string(),
        desktop: "none".to_string(),
        arch: "amd64".to_string(),
    };
    let request = SetupRequest {
        command: "setup".to_string(),
        config: json!({"shell": "zsh"}),
        parameters: HashMap::new(),
        environment: EnvironmentInfo::from(&system),
        config_path: None,
    };

    let value = serde_json::to_value(&request).expect("serialize");
    assert_eq!(value["command"], "setup");
    assert_eq!(value["environment"]["os"], "linux");
    assert_eq!(value["environment"]["has_desktop"], false);
    // Absent config_path is omitted entirely.
    assert!(value.get("config_path").is_none());
}

#[test]
fn response_statuses_use_snake_case() {
    let raw = r#"{"status":"in_progress","progress":40,"message":"installing"}"#;
    let response: SetupResponse = serde_json::from_str(raw).expect("parse");
    assert_eq!(response.status, SetupStatus::InProgress);
    assert_eq!(response.progress, 40);
    assert!(!response.is_error());

    let raw = r#"{"status":"error","progress":0,"message":"","error":"apt failed"}"#;
    let response: SetupResponse = serde_json::from_str(raw).expect("parse");
    assert!(response.is_error());
    assert_eq!(response.error.as_deref(), Some("apt failed"));
}

#[test]
fn plain_text_wrapping_is_success() {
    let response = SetupResponse::plain_text("did things\n");
    assert_eq!(response.status, SetupStatus::Success);
    assert_eq!(response.progress, 100);
    assert_eq!(response.message, "did things");
    assert!(response.error.is_none());
}

#[test]
fn plugin_info_defaults_tolerate_sparse_documents() {
    let info: PluginInfo = serde_json::from_str(r#"{"name":"tool-shell"}"#).expect("parse");
    assert_eq!(info.name, "tool-shell");
    assert_eq!(info.version, "");

    let unknown = PluginInfo::unknown("mystery");
    assert_eq!(unknown.version, "unknown");
}
