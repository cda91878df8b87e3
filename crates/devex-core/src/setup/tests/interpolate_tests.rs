use serde_json::json;

use crate::platform::SystemInfo;
use crate::setup::interpolate::interpolate;
use crate::setup::state::SetupState;

fn state() -> SetupState {
    let mut state = SetupState::new(SystemInfo {
        os: "linux".to_string(),
        distribution: "debian".to_string(),
        desktop: "gnome".to_string(),
        arch: "amd64".to_string(),
    });
    state.set_answer("git_full_name", json!("Jane"));
    state.set_answer("langs", json!(["go", "rust"]));
    state
}

#[test]
fn renders_answers_and_joins_slices() {
    let rendered = interpolate(
        "Hi {{ git_full_name }}: {{ langs | join(sep=\", \") }}",
        &state(),
    );
    assert_eq!(rendered, "Hi Jane: go, rust");
}

#[test]
fn system_facts_are_available() {
    let rendered = interpolate("{{ os }}/{{ arch }} on {{ desktop }}", &state());
    assert_eq!(rendered, "linux/amd64 on gnome");
}

#[test]
fn answers_shadow_system_facts() {
    let mut state = state();
    state.set_answer("os", json!("overridden"));
    assert_eq!(interpolate("{{ os }}", &state), "overridden");
}

#[test]
fn missing_keys_leave_the_literal_untouched() {
    let template = "Hello {{ not_a_variable }}";
    assert_eq!(interpolate(template, &state()), template);
}

#[test]
fn plain_text_passes_through() {
    assert_eq!(interpolate("no templates here", &state()), "no templates here");
}

#[test]
fn config_mapping_placeholders_resolve() {
    let mut state = state();
    state.set_answer("shell", json!("zsh"));
    assert_eq!(interpolate("{{ shell }}", &state), "zsh");
}
