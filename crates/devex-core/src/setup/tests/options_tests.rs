use std::path::PathBuf;
use std::sync::Arc;

use tempfile::tempdir;

use crate::config::settings::Settings;
use crate::platform::SystemInfo;
use crate::setup::config::{ConfigTransform, OptionsSource, SystemProbe};
use crate::setup::error::SetupError;
use crate::setup::options::OptionsLoader;

fn loader_with_root(root: PathBuf) -> OptionsLoader {
    OptionsLoader::new(
        Arc::new(Settings::default()),
        SystemInfo {
            os: "linux".to_string(),
            distribution: "debian".to_string(),
            desktop: "gnome".to_string(),
            arch: "amd64".to_string(),
        },
        root,
    )
}

#[test]
fn language_and_theme_transforms_use_settings_fallbacks() {
    let loader = loader_with_root(PathBuf::from("/nonexistent"));

    let languages = loader
        .load(&OptionsSource::Config {
            transform: ConfigTransform::GetLanguageNames,
            path: None,
        })
        .expect("languages");
    assert!(languages.iter().any(|o| o.value == "nodejs"));

    let themes = loader
        .load(&OptionsSource::Config {
            transform: ConfigTransform::GetThemeNames,
            path: None,
        })
        .expect("themes");
    assert!(!themes.is_empty());
}

#[test]
fn shells_probe_is_fixed_and_described() {
    let loader = loader_with_root(PathBuf::from("/nonexistent"));
    let shells = loader
        .load(&OptionsSource::System {
            probe: SystemProbe::Shells,
        })
        .expect("shells");
    let values: Vec<_> = shells.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["bash", "zsh", "fish"]);
    assert!(shells.iter().all(|o| !o.description.is_empty()));
}

#[test]
fn desktop_environments_depend_on_os() {
    let loader = loader_with_root(PathBuf::from("/nonexistent"));
    let desktops = loader
        .load(&OptionsSource::System {
            probe: SystemProbe::DesktopEnvironments,
        })
        .expect("desktops");
    let values: Vec<_> = desktops.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["gnome", "kde", "xfce", "mate"]);

    let mac_loader = OptionsLoader::new(
        Arc::new(Settings::default()),
        SystemInfo {
            os: "darwin".to_string(),
            distribution: "unknown".to_string(),
            desktop: "aqua".to_string(),
            arch: "arm64".to_string(),
        },
        PathBuf::from("/nonexistent"),
    );
    assert!(mac_loader
        .load(&OptionsSource::System {
            probe: SystemProbe::DesktopEnvironments,
        })
        .expect("desktops")
        .is_empty());
}

#[test]
fn load_directory_uses_filename_stem_and_skips_junk() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("tokyo-night.yaml"),
        "name: Tokyo Night\ndescription: Dark theme\n",
    )
    .expect("write");
    std::fs::write(dir.path().join("nord.yml"), "name: Nord\n").expect("write");
    // Ignored: wrong extension, sub-directory, unparseable file.
    std::fs::write(dir.path().join("README.txt"), "not yaml").expect("write");
    std::fs::create_dir(dir.path().join("subdir.yaml")).expect("mkdir");
    std::fs::write(dir.path().join("broken.yaml"), ": [ not yaml").expect("write");

    let loader = loader_with_root(PathBuf::from("/nonexistent"));
    let options = loader
        .load(&OptionsSource::Config {
            transform: ConfigTransform::LoadDirectory,
            path: Some(dir.path().to_path_buf()),
        })
        .expect("options");

    let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["nord", "tokyo-night"]);
    let tokyo = options.iter().find(|o| o.value == "tokyo-night").unwrap();
    assert_eq!(tokyo.name, "Tokyo Night");
    assert_eq!(tokyo.description, "Dark theme");
}

#[test]
fn empty_or_missing_directory_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let loader = loader_with_root(PathBuf::from("/nonexistent"));

    match loader.load(&OptionsSource::Config {
        transform: ConfigTransform::LoadDirectory,
        path: Some(dir.path().to_path_buf()),
    }) {
        Err(SetupError::EmptyOptionsDirectory { .. }) => {}
        other => panic!("expected EmptyOptionsDirectory, got {:?}", other),
    }

    match loader.load(&OptionsSource::Config {
        transform: ConfigTransform::LoadDirectory,
        path: Some(dir.path().join("does-not-exist")),
    }) {
        Err(SetupError::EmptyOptionsDirectory { .. }) => {}
        other => panic!("expected EmptyOptionsDirectory, got {:?}", other),
    }
}

#[test]
fn relative_load_directory_paths_resolve_under_config_root() {
    let root = tempdir().expect("tempdir");
    let options_dir = root.path().join("setup-options");
    std::fs::create_dir_all(&options_dir).expect("mkdir");
    std::fs::write(options_dir.join("minimal.yaml"), "name: Minimal\n").expect("write");

    let loader = loader_with_root(root.path().to_path_buf());
    let options = loader
        .load(&OptionsSource::Config {
            transform: ConfigTransform::LoadDirectory,
            path: Some(PathBuf::from("setup-options")),
        })
        .expect("options");
    assert_eq!(options[0].value, "minimal");
}

#[test]
fn plugin_source_is_reserved_and_empty() {
    let loader = loader_with_root(PathBuf::from("/nonexistent"));
    let options = loader
        .load(&OptionsSource::Plugin {
            plugin: "future".to_string(),
        })
        .expect("plugin source");
    assert!(options.is_empty());
}
