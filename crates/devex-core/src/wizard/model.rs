//! Wizard coordination: cursor state, selection handling, key events, and
//! progress over the declarative step sequence.
//!
//! The model is UI-library-agnostic; a front-end renders its state and
//! feeds it [`WizardKey`] events. One deliberate oddity is preserved from
//! the original flow: on the theme step Enter records the selection but
//! does not advance, only `n` (coarse next) moves on.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::settings::NonInteractiveDefaults;
use crate::kernel::constants;
use crate::setup::config::{OptionItem, QuestionKind, SetupStep};
use crate::setup::error::SetupError;
use crate::setup::executor::SetupExecutor;
use crate::wizard::errors::ErrorCollector;

/// Key events the front-end can feed the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardKey {
    Enter,
    Space,
    Up,
    Down,
    /// Coarse forward navigation (`n`).
    Next,
    /// Coarse backward navigation (`p`).
    Prev,
    Backspace,
    Char(char),
}

/// What a key event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    Stay,
    Advanced,
    Backed,
    Completed,
    /// Validation rejected the pending answer; message is user-facing.
    Invalid(String),
}

pub struct WizardModel {
    executor: SetupExecutor,
    /// Options for the current question step.
    options: Vec<OptionItem>,
    pub cursor: usize,
    multi: BTreeSet<usize>,
    single: Option<usize>,
    text: String,
    toggle: bool,
    errors: Arc<ErrorCollector>,
    banner: Option<String>,
    plugins_installed: bool,
}

impl WizardModel {
    pub fn new(mut executor: SetupExecutor) -> Result<Self, SetupError> {
        executor.enter()?;
        let mut model = Self {
            executor,
            options: Vec::new(),
            cursor: 0,
            multi: BTreeSet::new(),
            single: None,
            text: String::new(),
            toggle: false,
            errors: Arc::new(ErrorCollector::new(constants::MAX_ERROR_MESSAGES)),
            banner: None,
            plugins_installed: false,
        };
        model.sync_step()?;
        Ok(model)
    }

    pub fn executor(&self) -> &SetupExecutor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut SetupExecutor {
        &mut self.executor
    }

    pub fn current_step(&self) -> Option<&SetupStep> {
        self.executor.current_step()
    }

    pub fn options(&self) -> &[OptionItem] {
        &self.options
    }

    pub fn text_value(&self) -> &str {
        &self.text
    }

    pub fn is_selected(&self, index: usize) -> bool {
        match self.current_question_kind() {
            Some(QuestionKind::MultiSelect) => self.multi.contains(&index),
            Some(QuestionKind::Select) => self.single == Some(index),
            _ => false,
        }
    }

    pub fn progress(&self) -> (usize, usize) {
        self.executor.progress()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn set_banner(&mut self, banner: Option<String>) {
        self.banner = banner;
    }

    pub fn plugins_installed(&self) -> bool {
        self.plugins_installed
    }

    pub fn set_plugins_installed(&mut self, installed: bool) {
        self.plugins_installed = installed;
    }

    pub fn errors(&self) -> Arc<ErrorCollector> {
        self.errors.clone()
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.errors.push(message);
    }

    pub fn is_complete(&self) -> bool {
        self.executor.is_complete()
    }

    fn current_question_kind(&self) -> Option<QuestionKind> {
        self.current_step()
            .and_then(|s| s.question())
            .map(|q| q.kind)
    }

    fn is_theme_step(&self) -> bool {
        self.current_step().map(|s| s.id == "theme").unwrap_or(false)
    }

    /// Reload per-step UI state after the cursor moved: options, cursor,
    /// selections (pre-seeded from any existing answer or default).
    fn sync_step(&mut self) -> Result<(), SetupError> {
        self.cursor = 0;
        self.multi.clear();
        self.single = None;
        self.text.clear();
        self.toggle = false;
        self.options.clear();

        let Some(step) = self.executor.current_step() else {
            return Ok(());
        };
        let Some(question) = step.question() else {
            return Ok(());
        };
        let question = question.clone();
        self.options = self.executor.load_options(&question)?;

        let seed = self
            .executor
            .state()
            .answer(&question.variable)
            .cloned()
            .or(question.default.clone());
        match (question.kind, seed) {
            (QuestionKind::Text, Some(Value::String(s))) => self.text = s,
            (QuestionKind::Bool, Some(Value::Bool(b))) => self.toggle = b,
            (QuestionKind::Select, Some(value)) => {
                let wanted = crate::setup::condition::canonical(Some(&value));
                self.single = self.options.iter().position(|o| o.value == wanted);
                if let Some(pos) = self.single {
                    self.cursor = pos;
                }
            }
            (QuestionKind::MultiSelect, Some(Value::Array(items))) => {
                for item in items {
                    let wanted = crate::setup::condition::canonical(Some(&item));
                    if let Some(pos) = self.options.iter().position(|o| o.value == wanted) {
                        self.multi.insert(pos);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The answer value represented by the current selection state.
    fn selection_value(&self) -> Option<Value> {
        let kind = self.current_question_kind()?;
        Some(match kind {
            QuestionKind::Text => json!(self.text.clone()),
            QuestionKind::Bool => json!(self.toggle),
            QuestionKind::Select => {
                let index = self.single.or(if self.options.is_empty() {
                    None
                } else {
                    Some(self.cursor)
                });
                match index.and_then(|i| self.options.get(i)) {
                    Some(option) => json!(option.value.clone()),
                    None => Value::Null,
                }
            }
            QuestionKind::MultiSelect => {
                let values: Vec<String> = self
                    .multi
                    .iter()
                    .filter_map(|&i| self.options.get(i))
                    .map(|o| o.value.clone())
                    .collect();
                json!(values)
            }
        })
    }

    /// Validate and store the pending answer for the current question.
    pub fn commit_answer(&mut self) -> Result<(), SetupError> {
        let Some(question) = self.current_step().and_then(|s| s.question()).cloned() else {
            return Ok(());
        };
        let value = self.selection_value().unwrap_or(Value::Null);
        self.executor.validate_answer(&question, &value)?;
        self.executor.set_answer(&question.variable, value);
        Ok(())
    }

    fn advance(&mut self) -> Result<WizardEvent, SetupError> {
        let advanced = self.executor.next_step()?.is_some();
        if advanced {
            self.sync_step()?;
            Ok(WizardEvent::Advanced)
        } else {
            Ok(WizardEvent::Completed)
        }
    }

    fn back(&mut self) -> Result<WizardEvent, SetupError> {
        match self.executor.prev_step().map(|step| step.is_some()) {
            Ok(_) => {
                self.sync_step()?;
                Ok(WizardEvent::Backed)
            }
            Err(SetupError::BackNotAllowed { .. }) => Ok(WizardEvent::Stay),
            Err(err) => Err(err),
        }
    }

    /// Handle one key event.
    pub fn handle_key(&mut self, key: WizardKey) -> Result<WizardEvent, SetupError> {
        let kind = self.current_question_kind();
        match key {
            WizardKey::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                Ok(WizardEvent::Stay)
            }
            WizardKey::Down => {
                if !self.options.is_empty() {
                    self.cursor = (self.cursor + 1).min(self.options.len() - 1);
                }
                Ok(WizardEvent::Stay)
            }
            WizardKey::Space => {
                match kind {
                    Some(QuestionKind::MultiSelect) => {
                        if self.multi.contains(&self.cursor) {
                            self.multi.remove(&self.cursor);
                        } else if self.cursor < self.options.len() {
                            self.multi.insert(self.cursor);
                        }
                    }
                    Some(QuestionKind::Select) => {
                        if self.cursor < self.options.len() {
                            self.single = Some(self.cursor);
                        }
                    }
                    Some(QuestionKind::Bool) => self.toggle = !self.toggle,
                    _ => {}
                }
                Ok(WizardEvent::Stay)
            }
            WizardKey::Char(c) => {
                if matches!(kind, Some(QuestionKind::Text)) && !c.is_control() {
                    self.text.push(c);
                }
                Ok(WizardEvent::Stay)
            }
            WizardKey::Backspace => {
                if matches!(kind, Some(QuestionKind::Text)) {
                    self.text.pop();
                }
                Ok(WizardEvent::Stay)
            }
            WizardKey::Enter => {
                match self.commit_answer() {
                    Ok(()) => {}
                    Err(SetupError::AnswerInvalid { message, .. }) => {
                        return Ok(WizardEvent::Invalid(message));
                    }
                    Err(err) => return Err(err),
                }
                if self.is_theme_step() {
                    // The theme step keeps its historical behavior: Enter
                    // records the choice, only `n` advances.
                    return Ok(WizardEvent::Stay);
                }
                self.advance()
            }
            WizardKey::Next => {
                // Coarse navigation: keep whatever answer validates, move
                // on regardless.
                if let Err(SetupError::AnswerInvalid { .. }) = self.commit_answer() {
                    log::debug!("Skipping invalid answer during coarse navigation");
                }
                self.advance()
            }
            WizardKey::Prev => self.back(),
        }
    }

    /// Fill answers for the non-interactive path and move the cursor to
    /// the confirmation step.
    pub fn apply_default_selections(
        &mut self,
        defaults: &NonInteractiveDefaults,
    ) -> Result<(), SetupError> {
        let theme = self
            .executor
            .load_options(&crate::setup::config::Question {
                variable: "theme".to_string(),
                prompt: String::new(),
                kind: QuestionKind::Select,
                options: Vec::new(),
                options_source: Some(crate::setup::config::OptionsSource::Config {
                    transform: crate::setup::config::ConfigTransform::GetThemeNames,
                    path: None,
                }),
                validation: None,
                default: None,
            })?
            .first()
            .map(|o| o.value.clone())
            .unwrap_or_default();

        let user = crate::security::safe_get_env_with_default("USER", "devex");
        let state = self.executor.state_mut();
        state.set_answer("shell", json!(defaults.shell));
        state.set_answer("languages", json!(defaults.languages));
        state.set_answer("databases", json!(defaults.databases));
        state.set_answer("desktop_apps", json!([] as [String; 0]));
        state.set_answer("theme", json!(theme));
        state.set_answer("git_full_name", json!(user));
        state.set_answer("git_email", json!(format!("{}@localhost", user)));

        // Walk forward to the confirmation step without touching answers.
        while let Some(step) = self.executor.current_step() {
            if step.id == "confirm" || step.action().is_some() {
                break;
            }
            if self.executor.next_step()?.is_none() {
                break;
            }
        }
        self.sync_step()?;
        Ok(())
    }
}
