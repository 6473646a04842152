//! Sequential execution of one phase.
//!
//! Steps run in registration order against the shared context. The first
//! failed step stops the phase; nothing after it is invoked. Each step's
//! payload is copied into the context under its own id, so later steps
//! (and the final validation gate) can read it.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace, warn};

use crate::core::{StepEntry, StepOutcome, StepRegistry, WorkflowContext};
use crate::workflow::Phase;

/// One step's outcome in the phase audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_id: String,
    pub outcome: StepOutcome,
}

/// Result of running every step of a phase, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub success: bool,
    pub failed_step: Option<String>,
    pub outcomes: Vec<StepRecord>,
}

impl PhaseOutcome {
    /// The outcome of the step that stopped the phase.
    pub fn failure(&self) -> Option<&StepOutcome> {
        let failed = self.failed_step.as_deref()?;
        self.outcomes
            .iter()
            .rev()
            .find(|r| r.step_id == failed)
            .map(|r| &r.outcome)
    }

    /// True if any step in the phase set `data[key] = true`.
    pub fn flag(&self, key: &str) -> bool {
        self.outcomes.iter().any(|r| r.outcome.flag(key))
    }

    /// Message of the last step that ran, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.outcomes.last().map(|r| r.outcome.message.as_str())
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.outcomes.iter().map(|r| r.step_id.as_str()).collect()
    }
}

pub struct PhaseRunner<'a> {
    registry: &'a StepRegistry,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(registry: &'a StepRegistry) -> Self {
        Self { registry }
    }

    pub fn run_phase(&self, phase: Phase, ctx: &mut WorkflowContext) -> PhaseOutcome {
        let _span = info_span!("phase", %phase).entered();
        let entries = self.registry.steps_for(phase);
        info!(steps = entries.len(), "running phase");

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = invoke(entry, ctx);
            ctx.record_step_data(&entry.id, outcome.data.clone());

            let success = outcome.success;
            outcomes.push(StepRecord {
                step_id: entry.id.clone(),
                outcome,
            });

            if !success {
                warn!(step = %entry.id, "step failed; stopping phase");
                return PhaseOutcome {
                    phase,
                    success: false,
                    failed_step: Some(entry.id.clone()),
                    outcomes,
                };
            }
        }

        info!("phase succeeded");
        PhaseOutcome {
            phase,
            success: true,
            failed_step: None,
            outcomes,
        }
    }
}

fn invoke(entry: &StepEntry, ctx: &mut WorkflowContext) -> StepOutcome {
    let step = entry.step();
    debug!(step = %entry.id, order = entry.order, "{}", step.description());

    let missing: Vec<&str> = step
        .requires()
        .iter()
        .copied()
        .filter(|key| !ctx.contains(key))
        .collect();
    if !missing.is_empty() {
        return StepOutcome::failure(format!(
            "missing required context key(s): {}",
            missing.join(", ")
        ));
    }

    let outcome = match catch_unwind(AssertUnwindSafe(|| step.execute(ctx))) {
        Ok(outcome) => outcome.normalized(),
        Err(payload) => StepOutcome::failure(format!(
            "step {} panicked: {}",
            entry.id,
            panic_message(payload.as_ref())
        )),
    };
    trace!(step = %entry.id, success = outcome.success, message = %outcome.message, "step finished");
    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
