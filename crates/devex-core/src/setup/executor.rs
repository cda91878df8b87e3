//! The step machine over a declarative `SetupConfig`.
//!
//! Advancing honors, in precedence order: an explicit `next_step` id, the
//! first matching `next_step_if` branch, then linear order. After every
//! move the candidate's `show_if` is evaluated; hidden steps are skipped
//! and resolution repeats. Backward navigation is gated by `allow_back`
//! on the current step and never rewinds past the first step.

use std::sync::Arc;

use serde_json::Value;

use crate::config::settings::Settings;
use crate::platform::SystemInfo;
use crate::setup::condition::{self, canonical, Condition};
use crate::setup::config::{OptionItem, OptionsSource, Question, SetupConfig, SetupStep};
use crate::setup::error::SetupError;
use crate::setup::interpolate;
use crate::setup::options::OptionsLoader;
use crate::setup::state::SetupState;

pub struct SetupExecutor {
    config: SetupConfig,
    state: SetupState,
    options: OptionsLoader,
}

impl SetupExecutor {
    pub fn new(
        config: SetupConfig,
        system: SystemInfo,
        settings: Arc<Settings>,
        config_root: std::path::PathBuf,
    ) -> Self {
        let options = OptionsLoader::new(settings, system.clone(), config_root);
        Self {
            config,
            state: SetupState::new(system),
            options,
        }
    }

    pub fn config(&self) -> &SetupConfig {
        &self.config
    }

    pub fn state(&self) -> &SetupState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SetupState {
        &mut self.state
    }

    /// The step the cursor is on, or None once the workflow completed.
    pub fn current_step(&self) -> Option<&SetupStep> {
        self.config.steps.get(self.state.current_step)
    }

    pub fn is_complete(&self) -> bool {
        self.state.current_step >= self.config.steps.len()
    }

    /// Total steps and the current position, for progress display.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.state.current_step.min(self.config.steps.len()),
            self.config.steps.len(),
        )
    }

    pub fn set_answer(&mut self, variable: &str, value: Value) {
        self.state.set_answer(variable, value);
    }

    fn step_visible(&self, index: usize) -> Result<bool, SetupError> {
        match self.config.steps.get(index).and_then(|s| s.show_if.as_ref()) {
            Some(show_if) => condition::evaluate(show_if, &self.state),
            None => Ok(true),
        }
    }

    /// Move the cursor to the first visible step, for a fresh run.
    pub fn enter(&mut self) -> Result<Option<&SetupStep>, SetupError> {
        let mut index = 0;
        while index < self.config.steps.len() {
            if self.step_visible(index)? {
                self.state.current_step = index;
                return Ok(self.config.steps.get(index));
            }
            index += 1;
        }
        self.state.current_step = self.config.steps.len();
        Ok(None)
    }

    /// Branch key check: `"variable=value"` or bare `"variable"`.
    fn branch_matches(&self, key: &str) -> bool {
        match key.split_once('=') {
            Some((variable, expected)) => {
                canonical(self.state.lookup(variable.trim())) == expected.trim()
            }
            None => {
                let value = self.state.lookup(key.trim());
                !canonical(value).is_empty()
            }
        }
    }

    /// Resolve where `from` leads, without visibility filtering.
    fn resolve_next_from(&self, from: usize) -> Result<Option<usize>, SetupError> {
        let step = self
            .config
            .steps
            .get(from)
            .ok_or(SetupError::StepOutOfRange { index: from })?;

        if let Some(target) = &step.navigation.next_step {
            return self
                .config
                .step_index(target)
                .map(Some)
                .ok_or_else(|| SetupError::UnknownStep { id: target.clone() });
        }

        for (key, target) in &step.navigation.next_step_if {
            if self.branch_matches(key) {
                return self
                    .config
                    .step_index(target)
                    .map(Some)
                    .ok_or_else(|| SetupError::UnknownStep { id: target.clone() });
            }
        }

        let next = from + 1;
        Ok(if next < self.config.steps.len() {
            Some(next)
        } else {
            None
        })
    }

    /// Advance to the next visible step. Returns None when the workflow
    /// is complete.
    pub fn next_step(&mut self) -> Result<Option<&SetupStep>, SetupError> {
        let mut from = self.state.current_step;
        // A step can be skipped at most once per advance; bound the walk
        // to detect navigation cycles.
        for _ in 0..=self.config.steps.len() {
            match self.resolve_next_from(from)? {
                None => {
                    self.state.current_step = self.config.steps.len();
                    return Ok(None);
                }
                Some(next) => {
                    if self.step_visible(next)? {
                        self.state.current_step = next;
                        return Ok(self.config.steps.get(next));
                    }
                    from = next;
                }
            }
        }
        Err(SetupError::InvalidCondition {
            reason: "navigation loop detected".to_string(),
        })
    }

    /// Step back. Fails unless the current step allows it; clamps at the
    /// first step. Hidden steps are skipped on the way back too.
    pub fn prev_step(&mut self) -> Result<Option<&SetupStep>, SetupError> {
        let current = self
            .current_step()
            .ok_or(SetupError::StepOutOfRange {
                index: self.state.current_step,
            })?;
        if !current.navigation.allow_back {
            return Err(SetupError::BackNotAllowed {
                id: current.id.clone(),
            });
        }

        let mut index = if let Some(target) = &current.navigation.prev_step {
            self.config
                .step_index(target)
                .ok_or_else(|| SetupError::UnknownStep { id: target.clone() })?
        } else if self.state.current_step == 0 {
            return Ok(self.current_step());
        } else {
            self.state.current_step - 1
        };

        loop {
            if self.step_visible(index)? {
                self.state.current_step = index;
                return Ok(self.config.steps.get(index));
            }
            if index == 0 {
                // Nothing visible before the cursor; stay put.
                return Ok(self.current_step());
            }
            index -= 1;
        }
    }

    /// Options for a question: the literal list filtered per-option by
    /// `show_if`, or the resolved dynamic source.
    pub fn load_options(&self, question: &Question) -> Result<Vec<OptionItem>, SetupError> {
        let dynamic = match &question.options_source {
            Some(OptionsSource::Static) | None => None,
            Some(source) => Some(self.options.load(source)?),
        };
        let items = match dynamic {
            Some(items) => items,
            None => question.options.clone(),
        };

        let mut visible = Vec::with_capacity(items.len());
        for item in items {
            let keep = match &item.show_if {
                Some(show_if) => condition::evaluate(show_if, &self.state)?,
                None => true,
            };
            if keep {
                visible.push(item);
            }
        }
        Ok(visible)
    }

    /// Enforce a question's validation rules against a candidate answer.
    pub fn validate_answer(&self, question: &Question, value: &Value) -> Result<(), SetupError> {
        let Some(validation) = &question.validation else {
            return Ok(());
        };
        let fail = |fallback: String| SetupError::AnswerInvalid {
            variable: question.variable.clone(),
            message: validation.message.clone().unwrap_or(fallback),
        };

        let is_empty = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if validation.required && is_empty {
            return Err(fail("a value is required".to_string()));
        }

        // min/max bound string length or selection count, by dynamic type.
        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let (Some(min), Some(len)) = (validation.min, length) {
            if len < min {
                return Err(fail(format!("at least {} required, got {}", min, len)));
            }
        }
        if let (Some(max), Some(len)) = (validation.max, length) {
            if len > max {
                return Err(fail(format!("at most {} allowed, got {}", max, len)));
            }
        }

        if let (Some(pattern), Value::String(s)) = (&validation.pattern, value) {
            let re = regex::Regex::new(pattern).map_err(|source| SetupError::InvalidRegex {
                pattern: pattern.clone(),
                source,
            })?;
            if !re.is_match(s) {
                return Err(fail("value does not match the required pattern".to_string()));
            }
        }
        Ok(())
    }

    /// Render a template against platform facts and answers.
    pub fn interpolate(&self, text: &str) -> String {
        interpolate::interpolate(text, &self.state)
    }

    /// Visibility check for arbitrary conditions (used by action steps).
    pub fn evaluate(&self, condition: &Condition) -> Result<bool, SetupError> {
        condition::evaluate(condition, &self.state)
    }
}
