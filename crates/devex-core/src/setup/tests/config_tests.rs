use crate::setup::config::{
    ActionSpec, ConfigTransform, OptionsSource, QuestionKind, SetupConfig, StepBody, SystemProbe,
};

const SAMPLE: &str = r#"
name: test-flow
allow_execute: false
steps:
  - id: welcome
    title: Welcome
    description: Greets the user
    type: info

  - id: shell
    type: question
    variable: shell
    prompt: Pick a shell
    kind: select
    options_source:
      type: system
      probe: shells
    validation:
      required: true
    navigation:
      allow_back: true

  - id: languages
    type: question
    variable: languages
    kind: multi_select
    options:
      - value: nodejs
        name: Node.js
      - value: python
        name: Python
    validation:
      min: 1
      message: pick at least one language

  - id: os-branch
    type: info
    navigation:
      next_step_if:
        os=linux: linux-step
        os=darwin: mac-step

  - id: linux-step
    type: action
    action: plugin
    plugin: tool-shell
    command: configure
    config_mapping:
      shell: "{{ shell }}"

  - id: mac-step
    type: action
    action: install
    parameters:
      install_languages: languages

  - id: themed
    type: question
    variable: theme
    options_source:
      type: config
      transform: get_theme_names
    show_if:
      system:
        has_desktop: true
"#;

#[test]
fn parses_the_full_step_schema() {
    let config = SetupConfig::from_yaml(SAMPLE).expect("parse");
    assert_eq!(config.name, "test-flow");
    assert!(!config.allow_execute);
    assert_eq!(config.steps.len(), 7);

    assert!(matches!(config.steps[0].body, StepBody::Info));

    let shell = config.steps[1].question().expect("question body");
    assert_eq!(shell.variable, "shell");
    assert_eq!(shell.kind, QuestionKind::Select);
    assert_eq!(
        shell.options_source,
        Some(OptionsSource::System {
            probe: SystemProbe::Shells
        })
    );
    assert!(shell.validation.as_ref().expect("validation").required);
    assert!(config.steps[1].navigation.allow_back);

    let languages = config.steps[2].question().expect("question body");
    assert_eq!(languages.kind, QuestionKind::MultiSelect);
    assert_eq!(languages.options.len(), 2);
    assert_eq!(languages.options[0].label(), "Node.js");
    assert_eq!(
        languages.validation.as_ref().and_then(|v| v.min),
        Some(1)
    );

    let branch = &config.steps[3].navigation.next_step_if;
    assert_eq!(branch.get("os=linux").map(String::as_str), Some("linux-step"));
    assert_eq!(branch.get("os=darwin").map(String::as_str), Some("mac-step"));

    match config.steps[4].action().expect("action body") {
        ActionSpec::Plugin {
            plugin,
            command,
            config_mapping,
            ..
        } => {
            assert_eq!(plugin, "tool-shell");
            assert_eq!(command, "configure");
            assert_eq!(
                config_mapping.get("shell").map(String::as_str),
                Some("{{ shell }}")
            );
        }
        other => panic!("expected plugin action, got {:?}", other),
    }

    match config.steps[5].action().expect("action body") {
        ActionSpec::Install { parameters } => {
            assert_eq!(
                parameters.get("install_languages"),
                Some(&serde_json::json!("languages"))
            );
        }
        other => panic!("expected install action, got {:?}", other),
    }

    let themed = config.steps[6].question().expect("question body");
    assert_eq!(
        themed.options_source,
        Some(OptionsSource::Config {
            transform: ConfigTransform::GetThemeNames,
            path: None
        })
    );
    assert!(config.steps[6].show_if.is_some());
}

#[test]
fn plugin_action_command_defaults_to_setup() {
    let yaml = r#"
steps:
  - id: generic
    type: action
    action: plugin
    plugin: desktop-gnome
"#;
    let config = SetupConfig::from_yaml(yaml).expect("parse");
    match config.steps[0].action().expect("action") {
        ActionSpec::Plugin { command, .. } => assert_eq!(command, "setup"),
        other => panic!("expected plugin action, got {:?}", other),
    }
}

#[test]
fn step_index_finds_ids() {
    let config = SetupConfig::from_yaml(SAMPLE).expect("parse");
    assert_eq!(config.step_index("welcome"), Some(0));
    assert_eq!(config.step_index("mac-step"), Some(5));
    assert_eq!(config.step_index("nope"), None);
}

#[test]
fn round_trips_through_yaml() {
    let config = SetupConfig::from_yaml(SAMPLE).expect("parse");
    let serialized = serde_yaml::to_string(&config).expect("serialize");
    let reparsed = SetupConfig::from_yaml(&serialized).expect("reparse");
    assert_eq!(config, reparsed);
}
