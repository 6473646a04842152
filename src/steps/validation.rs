//! Final validation gate of the Development phase.

use tracing::info;

use crate::core::{Step, StepOutcome, WorkflowContext};
use crate::orchestration::OutcomeAggregator;

/// Aggregates every finding recorded so far and fails unless approved.
///
/// A rejection is always terminal: issue text may mention outages without
/// the gate itself being unavailable.
pub struct ValidationStep {
    id: String,
    aggregator: OutcomeAggregator,
}

impl ValidationStep {
    pub fn new(id: impl Into<String>, aggregator: OutcomeAggregator) -> Self {
        Self {
            id: id.into(),
            aggregator,
        }
    }
}

impl Step for ValidationStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "final validation"
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> StepOutcome {
        let report = self.aggregator.aggregate_context(ctx);
        let value = match serde_json::to_value(&report) {
            Ok(value) => value,
            Err(e) => return StepOutcome::terminal(format!("could not encode validation report: {e}")),
        };

        let outcome = if report.approved {
            info!(recommendations = report.recommendations.len(), "project approved");
            StepOutcome::success(format!(
                "Project approved with {} recommendation(s)",
                report.recommendations.len()
            ))
        } else {
            StepOutcome::terminal(format!(
                "Project rejected: {}",
                report.issues.join("; ")
            ))
        };
        outcome
            .with_data("approved", report.approved)
            .with_data("report", value)
    }
}
