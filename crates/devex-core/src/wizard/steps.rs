//! The built-in wizard workflow, expressed as a declarative `SetupConfig`.
//!
//! Sequence: system overview, plugin install, desktop apps (desktop
//! platforms only), languages, databases, shell (not on Windows), theme,
//! git identity, confirmation, then the install/configure actions and the
//! completion screen.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};

use crate::config::settings::Settings;
use crate::setup::condition::{Condition, SystemCondition};
use crate::setup::config::{
    ActionSpec, ConfigTransform, ConfigureTarget, Navigation, OptionItem, OptionsSource, Question,
    QuestionKind, SetupConfig, SetupStep, StepBody, SystemProbe, Validation,
};

fn has_desktop() -> Condition {
    Condition::System(SystemCondition {
        has_desktop: Some(true),
        ..Default::default()
    })
}

fn not_windows() -> Condition {
    Condition::Not(Box::new(Condition::System(SystemCondition {
        os: Some("windows".to_string()),
        ..Default::default()
    })))
}

fn info(id: &str, title: &str, description: &str) -> SetupStep {
    SetupStep {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        navigation: Navigation::default(),
        show_if: None,
        body: StepBody::Info,
    }
}

fn question(id: &str, title: &str, question: Question) -> SetupStep {
    SetupStep {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        navigation: Navigation {
            allow_back: true,
            ..Default::default()
        },
        show_if: None,
        body: StepBody::Question(question),
    }
}

fn action(id: &str, title: &str, action: ActionSpec) -> SetupStep {
    SetupStep {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        navigation: Navigation::default(),
        show_if: None,
        body: StepBody::Action(action),
    }
}

/// Build the default wizard workflow for the current platform.
pub fn default_config(settings: &Settings) -> SetupConfig {
    let database_options: Vec<OptionItem> = settings
        .database_items()
        .iter()
        .map(|item| OptionItem::new(&item.effective_value(), &item.name, &item.description))
        .collect();

    let mut steps = vec![
        info(
            "system-overview",
            "System Overview",
            "Review detected platform facts before setup begins.",
        ),
        info(
            "plugin-install",
            "Plugin Install",
            "Required plugins are downloaded and verified.",
        ),
    ];

    let mut desktop_apps = question(
        "desktop-apps",
        "Desktop Applications",
        Question {
            variable: "desktop_apps".to_string(),
            prompt: "Select desktop applications to install".to_string(),
            kind: QuestionKind::MultiSelect,
            options: Vec::new(),
            options_source: Some(OptionsSource::Config {
                transform: ConfigTransform::FilterByPlatform,
                path: None,
            }),
            validation: None,
            default: None,
        },
    );
    desktop_apps.show_if = Some(has_desktop());
    steps.push(desktop_apps);

    steps.push(question(
        "languages",
        "Programming Languages",
        Question {
            variable: "languages".to_string(),
            prompt: "Select programming languages to install".to_string(),
            kind: QuestionKind::MultiSelect,
            options: Vec::new(),
            options_source: Some(OptionsSource::Config {
                transform: ConfigTransform::GetLanguageNames,
                path: None,
            }),
            validation: None,
            default: None,
        },
    ));

    steps.push(question(
        "databases",
        "Databases",
        Question {
            variable: "databases".to_string(),
            prompt: "Select databases to install".to_string(),
            kind: QuestionKind::MultiSelect,
            options: database_options,
            options_source: None,
            validation: None,
            default: None,
        },
    ));

    let mut shell = question(
        "shell",
        "Shell",
        Question {
            variable: "shell".to_string(),
            prompt: "Pick your login shell".to_string(),
            kind: QuestionKind::Select,
            options: Vec::new(),
            options_source: Some(OptionsSource::System {
                probe: SystemProbe::Shells,
            }),
            validation: Some(Validation {
                required: true,
                ..Default::default()
            }),
            default: Some(json!("zsh")),
        },
    );
    shell.show_if = Some(not_windows());
    steps.push(shell);

    steps.push(question(
        "theme",
        "Theme",
        Question {
            variable: "theme".to_string(),
            prompt: "Pick a theme".to_string(),
            kind: QuestionKind::Select,
            options: Vec::new(),
            options_source: Some(OptionsSource::Config {
                transform: ConfigTransform::GetThemeNames,
                path: None,
            }),
            validation: None,
            default: None,
        },
    ));

    steps.push(question(
        "git-name",
        "Git Identity",
        Question {
            variable: "git_full_name".to_string(),
            prompt: "Your full name for git commits".to_string(),
            kind: QuestionKind::Text,
            options: Vec::new(),
            options_source: None,
            validation: Some(Validation {
                required: true,
                min: Some(2),
                ..Default::default()
            }),
            default: None,
        },
    ));

    steps.push(question(
        "git-email",
        "Git Email",
        Question {
            variable: "git_email".to_string(),
            prompt: "Your email for git commits".to_string(),
            kind: QuestionKind::Text,
            options: Vec::new(),
            options_source: None,
            validation: Some(Validation {
                required: true,
                pattern: Some("^[^@\\s]+@[^@\\s]+$".to_string()),
                message: Some("enter a valid email address".to_string()),
                ..Default::default()
            }),
            default: None,
        },
    ));

    steps.push(info(
        "confirm",
        "Confirm",
        "Review your selections; Enter starts the installation.",
    ));

    steps.push(action(
        "install-languages",
        "Install Languages",
        ActionSpec::Install {
            parameters: HashMap::from([(
                "install_languages".to_string(),
                Value::String("languages".to_string()),
            )]),
        },
    ));
    steps.push(action(
        "install-databases",
        "Install Databases",
        ActionSpec::Install {
            parameters: HashMap::from([(
                "install_databases".to_string(),
                Value::String("databases".to_string()),
            )]),
        },
    ));
    let mut install_apps = action(
        "install-desktop-apps",
        "Install Desktop Apps",
        ActionSpec::Install {
            parameters: HashMap::from([(
                "install_desktop_apps".to_string(),
                Value::String("desktop_apps".to_string()),
            )]),
        },
    );
    install_apps.show_if = Some(has_desktop());
    steps.push(install_apps);

    let mut configure_shell = action(
        "configure-shell",
        "Configure Shell",
        ActionSpec::Configure {
            target: ConfigureTarget::Shell,
            parameters: BTreeMap::new(),
        },
    );
    configure_shell.show_if = Some(not_windows());
    steps.push(configure_shell);

    let mut configure_desktop = action(
        "configure-desktop",
        "Configure Desktop",
        ActionSpec::Configure {
            target: ConfigureTarget::Desktop,
            parameters: BTreeMap::new(),
        },
    );
    configure_desktop.show_if = Some(has_desktop());
    steps.push(configure_desktop);

    steps.push(action(
        "configure-git",
        "Configure Git",
        ActionSpec::Configure {
            target: ConfigureTarget::Git,
            parameters: BTreeMap::new(),
        },
    ));

    steps.push(info(
        "complete",
        "Complete",
        "Your development environment is ready.",
    ));

    SetupConfig {
        name: "devex-setup".to_string(),
        allow_execute: false,
        steps,
    }
}
