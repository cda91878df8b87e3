//! # DevEx Core Setup Engine
//!
//! The declarative workflow engine driving the wizard: step definitions
//! are data, and conditions, option sources, validations, and actions are
//! interpreted at runtime. Replacing the terminal front-end with another
//! surface requires no executor changes.
//!
//! ## Submodules
//!
//! - [`config`]: the `SetupConfig`/`SetupStep` schema
//!   (info / question / action), navigation, validation, option sources.
//! - [`state`]: per-run answers, platform facts, install bookkeeping.
//! - [`executor`]: [`SetupExecutor`]: the step machine with conditional
//!   branching, `show_if` skipping, answer validation, and interpolation.
//! - [`condition`]: the composable [`Condition`] predicate tree and its
//!   evaluator.
//! - [`options`]: [`OptionsLoader`]: settings transforms, directory
//!   scans, and system probes.
//! - [`actions`]: [`ActionExecutor`]: turns action steps into plugin
//!   invocations over the setup protocol.
//! - [`interpolate`]: template rendering against facts + answers.
//! - [`error`]: [`SetupError`](error::SetupError).
pub mod actions;
pub mod condition;
pub mod config;
pub mod error;
pub mod executor;
pub mod interpolate;
pub mod options;
pub mod state;

pub use actions::{ActionExecutor, ActionOutcome};
pub use condition::{Condition, SystemCondition, VarOperator, VariableCondition};
pub use config::{
    ActionSpec, ConfigTransform, ConfigureTarget, Navigation, OptionItem, OptionsSource, Question,
    QuestionKind, SetupConfig, SetupStep, StepBody, SystemProbe, Validation,
};
pub use error::SetupError;
pub use executor::SetupExecutor;
pub use options::OptionsLoader;
pub use state::SetupState;

// Test module declaration
#[cfg(test)]
mod tests;
