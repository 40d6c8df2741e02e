//! Flash steps as first-class data
//!
//! Whether a nonzero exit aborts the sequence is a property of the step
//! record, never inferred from the command text.

use std::time::Duration;

use gwr_ssh::RemoteSession;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FlashError, FlashResult};

/// One remote command in an ordered sequence
#[derive(Debug, Clone)]
pub struct FlashStep {
    pub name: &'static str,
    pub command: String,
    pub timeout: Duration,
    /// When set, a nonzero exit is recorded but does not abort the
    /// sequence (e.g. killing a process that may already be gone).
    pub tolerate_nonzero: bool,
}

impl FlashStep {
    pub fn fatal(name: &'static str, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name,
            command: command.into(),
            timeout,
            tolerate_nonzero: false,
        }
    }

    pub fn tolerated(name: &'static str, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name,
            command: command.into(),
            timeout,
            tolerate_nonzero: true,
        }
    }
}

/// Recorded result of one executed step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub name: &'static str,
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run steps in order against the session.
///
/// A nonzero exit on a non-tolerated step aborts the remaining steps with
/// [`FlashError::StepFailed`]. Tolerated steps record their outcome and
/// the sequence continues.
pub async fn run_steps(
    session: &RemoteSession,
    steps: Vec<FlashStep>,
) -> FlashResult<Vec<StepOutcome>> {
    let mut outcomes = Vec::with_capacity(steps.len());

    for step in steps {
        let out = session.execute_command(&step.command, step.timeout).await?;
        let succeeded = out.exit_code == 0;
        debug!(step = step.name, exit_code = out.exit_code, "step finished");

        outcomes.push(StepOutcome {
            name: step.name,
            succeeded,
            stdout: out.stdout.clone(),
            stderr: out.stderr.clone(),
            exit_code: out.exit_code,
        });

        if !succeeded {
            if step.tolerate_nonzero {
                warn!(
                    step = step.name,
                    exit_code = out.exit_code,
                    "tolerated nonzero exit, continuing"
                );
            } else {
                return Err(FlashError::StepFailed {
                    name: step.name,
                    exit_code: out.exit_code,
                    stderr: out.stderr,
                });
            }
        }
    }

    Ok(outcomes)
}
