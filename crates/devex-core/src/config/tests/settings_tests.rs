use tempfile::tempdir;

use crate::config::settings::{slugify, Settings};
use crate::platform::SystemInfo;

fn linux_desktop() -> SystemInfo {
    SystemInfo {
        os: "linux".to_string(),
        distribution: "debian".to_string(),
        desktop: "gnome".to_string(),
        arch: "amd64".to_string(),
    }
}

#[test]
fn missing_settings_file_yields_defaults() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::load(dir.path()).expect("load");

    assert!(!settings.language_items().is_empty());
    assert!(!settings.database_items().is_empty());
    assert!(!settings.theme_items().is_empty());
    assert_eq!(settings.defaults.shell, "zsh");
    assert_eq!(settings.defaults.languages, vec!["nodejs", "python"]);
    assert_eq!(settings.defaults.databases, vec!["postgresql"]);
}

#[test]
fn settings_file_overrides_lists() {
    let dir = tempdir().expect("tempdir");
    let yaml = r#"
programming_languages:
  - name: Zig
    description: A better C
themes:
  - name: Dracula
critical_plugins:
  - tool-shell
"#;
    std::fs::write(dir.path().join("settings.yaml"), yaml).expect("write");

    let settings = Settings::load(dir.path()).expect("load");
    let langs = settings.language_items();
    assert_eq!(langs.len(), 1);
    assert_eq!(langs[0].name, "Zig");
    assert_eq!(settings.theme_items()[0].name, "Dracula");
    assert_eq!(settings.critical_plugins, vec!["tool-shell"]);
    // Databases fall back to built-ins.
    assert!(!settings.database_items().is_empty());
}

#[test]
fn malformed_settings_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("settings.yaml"), ": not yaml [").expect("write");
    assert!(Settings::load(dir.path()).is_err());
}

#[test]
fn desktop_apps_filter_by_platform() {
    let yaml = r#"
desktop_apps:
  - name: Firefox
    platforms: [linux, darwin]
  - name: Finder Tweaks
    platforms: [darwin]
  - name: Everywhere
"#;
    let settings: Settings = serde_yaml::from_str(yaml).expect("parse");
    let apps = settings.desktop_apps_for(&linux_desktop());
    let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Firefox", "Everywhere"]);
}

#[test]
fn package_manager_plugin_follows_distribution() {
    let settings = Settings::default();
    let mut system = linux_desktop();
    assert_eq!(settings.package_manager_plugin(&system), "package-manager-apt");
    system.distribution = "fedora".to_string();
    assert_eq!(settings.package_manager_plugin(&system), "package-manager-dnf");
}

#[test]
fn slugify_strips_punctuation() {
    assert_eq!(slugify("Node.js"), "nodejs");
    assert_eq!(slugify("Tokyo Night"), "tokyo-night");
    assert_eq!(slugify("PostgreSQL"), "postgresql");
    assert_eq!(slugify("  C++  "), "c");
}
