//! Template interpolation for prompts, descriptions, and config mappings.
//!
//! Templates render against a context merging platform facts and answers
//! (answers win). The engine's built-in `join` filter handles slices:
//! `{{ langs | join(sep=", ") }}`. Render failures: unknown keys
//! included: leave the literal text untouched.

use crate::setup::state::SetupState;

/// Render `text` against the state. Infallible by contract: any template
/// error returns the input unchanged.
pub fn interpolate(text: &str, state: &SetupState) -> String {
    if !text.contains("{{") && !text.contains("{%") {
        return text.to_string();
    }

    let mut context = tera::Context::new();
    for (key, value) in state.system_info() {
        context.insert(key, value);
    }
    for (key, value) in &state.answers {
        context.insert(key, value);
    }

    match tera::Tera::one_off(text, &context, false) {
        Ok(rendered) => rendered,
        Err(err) => {
            log::debug!("Template left as-is ({}): {}", err, text);
            text.to_string()
        }
    }
}
