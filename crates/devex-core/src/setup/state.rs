//! Mutable state of one wizard run: step cursor, collected answers,
//! platform facts, install bookkeeping, and surfaced errors.
//!
//! Answers never cross runs; the state dies with the run.

use std::collections::HashMap;

use serde_json::Value;

use crate::platform::SystemInfo;

#[derive(Debug, Clone)]
pub struct SetupState {
    pub current_step: usize,
    pub answers: HashMap<String, Value>,
    pub system: SystemInfo,
    /// Platform facts as JSON, for conditions and interpolation.
    system_info: HashMap<String, Value>,
    pub install_state: HashMap<String, Value>,
    pub errors: Vec<String>,
}

impl SetupState {
    pub fn new(system: SystemInfo) -> Self {
        let system_info = system.as_map();
        Self {
            current_step: 0,
            answers: HashMap::new(),
            system,
            system_info,
            install_state: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn set_answer(&mut self, variable: impl Into<String>, value: Value) {
        self.answers.insert(variable.into(), value);
    }

    pub fn answer(&self, variable: &str) -> Option<&Value> {
        self.answers.get(variable)
    }

    /// Resolve a variable: answers first, then platform facts.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.answers.get(name).or_else(|| self.system_info.get(name))
    }

    pub fn system_info(&self) -> &HashMap<String, Value> {
        &self.system_info
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}
