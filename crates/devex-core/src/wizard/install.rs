//! Drives the installation phase: executes every remaining action step,
//! aggregating failures into the wizard's bounded error list.
//!
//! Failures never stop the walk: post-install configuration (shell,
//! desktop, git) still runs when earlier installs fail, matching the
//! degraded-but-forward behavior of the rest of the wizard.

use crate::setup::actions::ActionExecutor;
use crate::setup::error::SetupError;
use crate::wizard::model::WizardModel;

/// Counts for the final report and exit-code policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl InstallSummary {
    pub fn merge_outcome(&mut self, ok: bool) {
        self.attempted += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Execute action steps from the current cursor until the workflow ends
/// or a non-action step (the completion screen) is reached with no more
/// actions behind it.
pub async fn run_install(
    model: &mut WizardModel,
    actions: &ActionExecutor,
) -> Result<InstallSummary, SetupError> {
    let mut summary = InstallSummary::default();

    loop {
        let Some(step) = model.current_step() else {
            break;
        };
        let Some(spec) = step.action().cloned() else {
            // Skip over non-action steps (confirm/complete screens).
            if model.executor_mut().next_step()?.is_none() {
                break;
            }
            continue;
        };
        let step_title = step.title.clone();

        match actions.execute(&spec, model.executor().state()).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    log::info!("{}: {}", step_title, outcome.message);
                    summary.merge_outcome(true);
                }
            }
            Err(err) => {
                summary.merge_outcome(false);
                model.push_error(format!("{}: {}", step_title, err));
                log::error!("{} failed: {}", step_title, err);
            }
        }

        if model.executor_mut().next_step()?.is_none() {
            break;
        }
    }

    log::info!(
        "Setup finished: {} attempted, {} succeeded, {} failed",
        summary.attempted,
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}
