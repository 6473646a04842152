//! Conversational scope definition.
//!
//! Each Definition-phase call is one exchange. Inputs accumulate into the
//! project requirements until the user says "start development" (or "begin
//! development"), at which point the step asserts `scope_confirmed`.

use serde_json::{json, Value};
use tracing::info;

use crate::core::{keys, Step, StepOutcome, WorkflowContext};

const START_COMMANDS: &[&str] = &["start development", "begin development"];

pub struct ScopeStep {
    id: String,
}

impl ScopeStep {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn is_start_command(input: &str) -> bool {
        let lower = input.to_lowercase();
        START_COMMANDS.iter().any(|c| lower.contains(c))
    }
}

impl Default for ScopeStep {
    fn default() -> Self {
        Self::new("scope")
    }
}

impl Step for ScopeStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "agree project scope with the user"
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> StepOutcome {
        let Some(input) = ctx.user_input().map(str::trim).map(str::to_string) else {
            return StepOutcome::success("Describe the project you want to build.");
        };
        if input.is_empty() {
            return StepOutcome::success("Describe the project you want to build.");
        }

        record_exchange(ctx, &input);
        let notes = requirement_notes(ctx);

        if Self::is_start_command(&input) {
            if notes.is_empty() {
                return StepOutcome::success(
                    "Describe the project before starting development.",
                );
            }
            info!(notes = notes.len(), "project scope confirmed");
            return StepOutcome::success("Project scope confirmed and ready for development.")
                .with_data(keys::SCOPE_CONFIRMED, true)
                .with_data("notes", notes.len());
        }

        let mut updated = notes;
        if updated.last() != Some(&input) {
            updated.push(input.clone());
        }
        ctx.upsert(
            keys::PROJECT_REQUIREMENTS,
            json!({ "description": updated[0], "notes": updated }),
        );
        StepOutcome::success(format!(
            "Noted: {input}. Say \"start development\" when the scope is complete."
        ))
        .with_data("notes", updated.len())
    }
}

/// Append the exchange unless it is a replay of the latest one.
fn record_exchange(ctx: &mut WorkflowContext, input: &str) {
    let mut conversation = ctx
        .get(keys::CONVERSATION)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if conversation.last().and_then(Value::as_str) == Some(input) {
        return;
    }
    conversation.push(Value::String(input.to_string()));
    ctx.upsert(keys::CONVERSATION, Value::Array(conversation));
}

fn requirement_notes(ctx: &WorkflowContext) -> Vec<String> {
    ctx.project_requirements()
        .and_then(|r| r.get("notes"))
        .and_then(Value::as_array)
        .map(|notes| {
            notes
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
