//! Setup check for required executables.

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::{Step, StepOutcome, WorkflowContext};

/// Verifies every configured tool resolves on `PATH`.
///
/// A missing tool is reported as an unavailable dependency, so the run
/// pauses until the user installs it and asks to try again.
pub struct ToolCheckStep {
    id: String,
    tools: Vec<String>,
}

impl ToolCheckStep {
    pub fn new<I, S>(id: impl Into<String>, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            tools: tools.into_iter().map(Into::into).collect(),
        }
    }
}

impl Step for ToolCheckStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "check required tools"
    }

    fn execute(&self, _ctx: &mut WorkflowContext) -> StepOutcome {
        let mut found = Map::new();
        let mut missing = Vec::new();

        for tool in &self.tools {
            match which::which(tool) {
                Ok(path) => {
                    debug!(tool = %tool, path = %path.display(), "tool found");
                    found.insert(tool.clone(), Value::String(path.display().to_string()));
                }
                Err(_) => missing.push(tool.as_str()),
            }
        }

        if !missing.is_empty() {
            return StepOutcome::unavailable(format!(
                "required tool(s) unavailable: {}",
                missing.join(", ")
            ))
            .with_data("tools", found);
        }

        StepOutcome::success(format!("{} tool(s) available", self.tools.len()))
            .with_data("tools", found)
    }
}
