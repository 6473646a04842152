//! The step contract and its structured outcome.
//!
//! A step is a named unit of work run against the shared context. Steps
//! report every failure through [`StepOutcome`]; they never return errors
//! or panic across this boundary (the runner converts panics anyway).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::WorkflowContext;

/// Payload key carrying an explicit failure category.
pub const FAILURE_CLASS_KEY: &str = "failure_class";

/// Failure category for an external dependency that is temporarily gone.
pub const DEPENDENCY_UNAVAILABLE: &str = "dependency_unavailable";

/// Failure category that never pauses, whatever the message says.
pub const TERMINAL_FAILURE: &str = "terminal";

const UNSPECIFIED_FAILURE: &str = "step failed without a message";

/// Result of one step.
///
/// A failed outcome always carries a non-empty message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl StepOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Map::new(),
        }
        .normalized()
    }

    /// A failure caused by an external dependency being unavailable.
    ///
    /// The orchestrator pauses on these instead of failing the run.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::failure(message).with_data(FAILURE_CLASS_KEY, DEPENDENCY_UNAVAILABLE)
    }

    /// A failure that must fail the phase even if its message mentions
    /// timeouts or outages (tool output, validation issues).
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::failure(message).with_data(FAILURE_CLASS_KEY, TERMINAL_FAILURE)
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// True when `data[key]` is the boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.data.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn failure_class(&self) -> Option<&str> {
        self.data.get(FAILURE_CLASS_KEY).and_then(Value::as_str)
    }

    /// Enforce the non-empty message rule on failures.
    pub fn normalized(mut self) -> Self {
        if !self.success && self.message.trim().is_empty() {
            self.message = UNSPECIFIED_FAILURE.to_string();
        }
        self
    }
}

/// A named unit of work within a phase.
///
/// Implementations must be safe to invoke again after a pause/resume cycle:
/// a paused phase restarts from its first step.
///
/// A panic inside `execute` is caught and reported as a failed outcome, but
/// the process panic hook still runs, so the default hook prints the panic
/// to stderr. Binaries that want silence install their own hook.
pub trait Step: Send {
    /// Identifier, unique within a registry.
    fn id(&self) -> &str;

    /// Human-readable summary used in logs.
    fn description(&self) -> &str {
        self.id()
    }

    /// Context keys that must exist before this step can run.
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> StepOutcome;
}

/// A step backed by a closure.
pub struct FnStep<F> {
    id: String,
    requires: Vec<&'static str>,
    f: F,
}

impl<F> FnStep<F>
where
    F: Fn(&mut WorkflowContext) -> StepOutcome + Send,
{
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self {
            id: id.into(),
            requires: Vec::new(),
            f,
        }
    }

    pub fn requiring(mut self, keys: &[&'static str]) -> Self {
        self.requires.extend_from_slice(keys);
        self
    }
}

impl<F> Step for FnStep<F>
where
    F: Fn(&mut WorkflowContext) -> StepOutcome + Send,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn requires(&self) -> &[&'static str] {
        &self.requires
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> StepOutcome {
        (self.f)(ctx)
    }
}
