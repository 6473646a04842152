//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Scripted steps that replay a fixed sequence of outcomes
//! - A shared call log recording the order steps were invoked in
//! - Predefined pipelines

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agentflow::core::{keys, Step, StepOutcome, StepRegistry, WorkflowContext};
use agentflow::workflow::Phase;

/// Ordered record of step invocations shared by every step of a pipeline.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: &str) {
        self.0.lock().unwrap().push(id.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, id: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| *c == id).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A step that returns its scripted outcomes in order, then repeats the last.
pub struct ScriptedStep {
    id: String,
    script: Vec<StepOutcome>,
    calls: Arc<AtomicUsize>,
    log: CallLog,
}

impl ScriptedStep {
    pub fn new(id: &str, log: &CallLog, script: Vec<StepOutcome>) -> Self {
        assert!(!script.is_empty(), "a scripted step needs at least one outcome");
        Self {
            id: id.to_string(),
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            log: log.clone(),
        }
    }

    pub fn ok(id: &str, log: &CallLog) -> Self {
        Self::new(id, log, vec![StepOutcome::success(format!("{id} done"))])
    }

    /// Fails with `message` for the first `times` calls, then succeeds.
    pub fn failing_then_ok(id: &str, log: &CallLog, message: &str, times: usize) -> Self {
        let mut script: Vec<StepOutcome> =
            (0..times).map(|_| StepOutcome::failure(message)).collect();
        script.push(StepOutcome::success(format!("{id} done")));
        Self::new(id, log, script)
    }

    /// Counter shared with the step, readable after it moves into a registry.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Step for ScriptedStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn execute(&self, _ctx: &mut WorkflowContext) -> StepOutcome {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.record(&self.id);
        let index = n.min(self.script.len() - 1);
        self.script[index].clone()
    }
}

/// Outcome of a Definition step that agrees the scope.
pub fn scope_confirmed() -> StepOutcome {
    StepOutcome::success("scope confirmed").with_data(keys::SCOPE_CONFIRMED, true)
}

/// One succeeding step per phase, with Definition confirming scope.
pub fn happy_pipeline(log: &CallLog) -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry
        .register(Phase::Setup, 0, ScriptedStep::ok("env", log))
        .unwrap();
    registry
        .register(
            Phase::Definition,
            0,
            ScriptedStep::new("coordinator", log, vec![scope_confirmed()]),
        )
        .unwrap();
    registry
        .register(Phase::Development, 0, ScriptedStep::ok("arch", log))
        .unwrap();
    registry
        .register(Phase::Development, 1, ScriptedStep::ok("core", log))
        .unwrap();
    registry
        .register(Phase::Delivery, 0, ScriptedStep::ok("deploy", log))
        .unwrap();
    registry
}

pub fn count(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
