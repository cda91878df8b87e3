use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::settings::Settings;
use crate::platform::SystemInfo;
use crate::setup::config::SetupConfig;
use crate::setup::error::SetupError;
use crate::setup::executor::SetupExecutor;

fn system(os: &str) -> SystemInfo {
    SystemInfo {
        os: os.to_string(),
        distribution: "debian".to_string(),
        desktop: "gnome".to_string(),
        arch: "amd64".to_string(),
    }
}

fn executor(yaml: &str, os: &str) -> SetupExecutor {
    let config = SetupConfig::from_yaml(yaml).expect("parse config");
    SetupExecutor::new(
        config,
        system(os),
        Arc::new(Settings::default()),
        PathBuf::from("/nonexistent-config-root"),
    )
}

const BRANCHING: &str = r#"
steps:
  - id: a
    type: info
    navigation:
      next_step_if:
        os=linux: b
        os=darwin: c
  - id: fallback
    type: info
  - id: b
    type: info
  - id: c
    type: info
"#;

#[test]
fn branch_keys_route_by_variable_value() {
    // os=linux routes to b.
    let mut exec = executor(BRANCHING, "linux");
    exec.enter().expect("enter");
    let next = exec.next_step().expect("advance").expect("step");
    assert_eq!(next.id, "b");

    // os=darwin routes to c.
    let mut exec = executor(BRANCHING, "darwin");
    exec.enter().expect("enter");
    let next = exec.next_step().expect("advance").expect("step");
    assert_eq!(next.id, "c");

    // Anything else falls through to the linear successor.
    let mut exec = executor(BRANCHING, "freebsd");
    exec.enter().expect("enter");
    let next = exec.next_step().expect("advance").expect("step");
    assert_eq!(next.id, "fallback");
}

#[test]
fn bare_branch_key_checks_existence() {
    let yaml = r#"
steps:
  - id: start
    type: info
    navigation:
      next_step_if:
        wants_extras: extras
  - id: plain
    type: info
  - id: extras
    type: info
"#;
    let mut exec = executor(yaml, "linux");
    exec.enter().expect("enter");
    exec.set_answer("wants_extras", json!("yes"));
    assert_eq!(exec.next_step().expect("advance").expect("step").id, "extras");

    let mut exec = executor(yaml, "linux");
    exec.enter().expect("enter");
    assert_eq!(exec.next_step().expect("advance").expect("step").id, "plain");
}

#[test]
fn explicit_next_step_beats_branches_and_unknown_id_errors() {
    let yaml = r#"
steps:
  - id: start
    type: info
    navigation:
      next_step: target
      next_step_if:
        os=linux: other
  - id: other
    type: info
  - id: target
    type: info
"#;
    let mut exec = executor(yaml, "linux");
    exec.enter().expect("enter");
    assert_eq!(exec.next_step().expect("advance").expect("step").id, "target");

    let yaml = r#"
steps:
  - id: start
    type: info
    navigation:
      next_step: missing
"#;
    let mut exec = executor(yaml, "linux");
    exec.enter().expect("enter");
    match exec.next_step() {
        Err(SetupError::UnknownStep { id }) => assert_eq!(id, "missing"),
        other => panic!("expected UnknownStep, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn hidden_steps_are_skipped_in_both_directions() {
    let yaml = r#"
steps:
  - id: start
    type: info
  - id: desktop-only
    type: info
    show_if:
      system:
        has_desktop: true
  - id: end
    type: info
    navigation:
      allow_back: true
"#;
    // Headless: desktop-only is skipped forward...
    let mut exec = executor(yaml, "linux");
    exec.state_mut().system.desktop = "none".to_string();
    exec.enter().expect("enter");
    assert_eq!(exec.next_step().expect("advance").expect("step").id, "end");
    // ...and skipped again on the way back.
    assert_eq!(exec.prev_step().expect("back").expect("step").id, "start");
}

#[test]
fn back_requires_allow_back_and_clamps_at_zero() {
    let yaml = r#"
steps:
  - id: first
    type: info
    navigation:
      allow_back: true
  - id: second
    type: info
"#;
    let mut exec = executor(yaml, "linux");
    exec.enter().expect("enter");

    // First step allows back but there is nothing before it: stay put.
    assert_eq!(exec.prev_step().expect("back").expect("step").id, "first");

    exec.next_step().expect("advance");
    // Second step does not allow back.
    match exec.prev_step() {
        Err(SetupError::BackNotAllowed { id }) => assert_eq!(id, "second"),
        other => panic!("expected BackNotAllowed, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn workflow_completes_after_last_step() {
    let yaml = r#"
steps:
  - id: only
    type: info
"#;
    let mut exec = executor(yaml, "linux");
    exec.enter().expect("enter");
    assert!(exec.next_step().expect("advance").is_none());
    assert!(exec.is_complete());
    assert!(exec.current_step().is_none());
}

const VALIDATED: &str = r#"
steps:
  - id: name
    type: question
    variable: git_full_name
    validation:
      required: true
      min: 2
      max: 10
  - id: email
    type: question
    variable: git_email
    validation:
      pattern: "^[^@]+@[^@]+$"
      message: enter a valid email address
  - id: langs
    type: question
    variable: languages
    kind: multi_select
    validation:
      min: 1
"#;

#[test]
fn answer_validation_enforces_rules() {
    let exec = executor(VALIDATED, "linux");
    let name_q = exec.config().steps[0].question().unwrap().clone();
    let email_q = exec.config().steps[1].question().unwrap().clone();
    let langs_q = exec.config().steps[2].question().unwrap().clone();

    assert!(exec.validate_answer(&name_q, &json!("Jane")).is_ok());
    assert!(exec.validate_answer(&name_q, &json!("")).is_err());
    assert!(exec.validate_answer(&name_q, &json!("J")).is_err());
    assert!(exec
        .validate_answer(&name_q, &json!("far-too-long-name"))
        .is_err());

    assert!(exec.validate_answer(&email_q, &json!("jane@example.com")).is_ok());
    match exec.validate_answer(&email_q, &json!("nope")) {
        Err(SetupError::AnswerInvalid { message, .. }) => {
            assert_eq!(message, "enter a valid email address");
        }
        other => panic!("expected AnswerInvalid, got {:?}", other),
    }

    // Slice length rules.
    assert!(exec.validate_answer(&langs_q, &json!(["go"])).is_ok());
    assert!(exec.validate_answer(&langs_q, &Value::Array(vec![])).is_err());
}

#[test]
fn static_options_filter_by_show_if() {
    let yaml = r#"
steps:
  - id: apps
    type: question
    variable: apps
    kind: multi_select
    options:
      - value: everywhere
      - value: desktop-only
        show_if:
          system:
            has_desktop: true
"#;
    let exec = executor(yaml, "linux");
    let question = exec.config().steps[0].question().unwrap().clone();
    let options = exec.load_options(&question).expect("options");
    assert_eq!(options.len(), 2);

    let mut headless = executor(yaml, "linux");
    headless.state_mut().system.desktop = "none".to_string();
    let options = headless.load_options(&question).expect("options");
    let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["everywhere"]);
}
