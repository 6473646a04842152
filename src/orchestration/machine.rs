//! The phase state machine driving one run.
//!
//! ```text
//! Setup -> Definition -> Development -> Delivery -> Completed
//!   \__________ Paused overlay on any non-terminal phase _________/
//! ```
//!
//! Every call does at most one phase attempt. A successful phase moves the
//! run forward (Definition also needs a confirmed scope). A recoverable
//! failure pauses the run in place; a terminal one is returned as
//! [`Error::PhaseFailed`] and the phase stays current.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{
    FailureClass, FailurePolicy, OutcomeAggregator, PhaseOutcome, PhaseRunner, ValidationReport,
};
use crate::config::{Config, DEFAULT_RESUME_PHRASE};
use crate::core::{keys, StepOutcome, StepRegistry, WorkflowContext};
use crate::snapshot::RunSnapshot;
use crate::workflow::{PauseState, Phase, PhaseHistoryEntry, PhaseTracker, RunId};
use crate::{Error, Result};

/// What one successful call to the state machine did.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The phase succeeded and the run moved on.
    Advanced {
        from: Phase,
        to: Phase,
        outcome: PhaseOutcome,
    },
    /// The phase succeeded but the run stays where it is (scope not confirmed).
    Held { phase: Phase, outcome: PhaseOutcome },
    /// A step failed recoverably; the run waits for a resume signal.
    Paused {
        phase: Phase,
        reason: String,
        outcome: PhaseOutcome,
    },
}

impl Advance {
    pub fn outcome(&self) -> &PhaseOutcome {
        match self {
            Advance::Advanced { outcome, .. }
            | Advance::Held { outcome, .. }
            | Advance::Paused { outcome, .. } => outcome,
        }
    }

    /// Phase the run is in after this call.
    pub fn phase(&self) -> Phase {
        match self {
            Advance::Advanced { to, .. } => *to,
            Advance::Held { phase, .. } | Advance::Paused { phase, .. } => *phase,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Advance::Paused { .. })
    }

    /// Message worth showing to whoever drives the run.
    pub fn message(&self) -> Option<&str> {
        match self {
            Advance::Paused { reason, .. } => Some(reason),
            _ => self.outcome().last_message(),
        }
    }
}

/// Read-only view of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub run_id: RunId,
    pub current_phase: Phase,
    pub paused: bool,
    pub pause_reason: Option<String>,
    pub registered_steps: Vec<String>,
}

pub struct Orchestrator {
    run_id: RunId,
    registry: StepRegistry,
    context: WorkflowContext,
    tracker: PhaseTracker,
    pause: PauseState,
    policy: FailurePolicy,
    resume_phrase: String,
    outcomes: Vec<PhaseOutcome>,
}

impl Orchestrator {
    /// Take ownership of the registry and seal it.
    pub fn new(mut registry: StepRegistry) -> Self {
        registry.seal();
        let run_id = RunId::new();
        info!(run = %run_id.short(), steps = registry.len(), "orchestrator created");
        Self {
            run_id,
            registry,
            context: WorkflowContext::new(),
            tracker: PhaseTracker::new(),
            pause: PauseState::default(),
            policy: FailurePolicy::default(),
            resume_phrase: DEFAULT_RESUME_PHRASE.to_string(),
            outcomes: Vec::new(),
        }
    }

    pub fn from_config(registry: StepRegistry, config: &Config) -> Result<Self> {
        let mut orchestrator = Self::new(registry)
            .with_policy(config.failure_policy()?)
            .with_resume_phrase(&config.resume_phrase);
        orchestrator.context.set_deployment_choice(config.deployment);
        Ok(orchestrator)
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_resume_phrase(mut self, phrase: &str) -> Self {
        self.resume_phrase = phrase.trim().to_string();
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.context
    }

    pub fn current_phase(&self) -> Phase {
        self.tracker.current_phase()
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn pause_state(&self) -> &PauseState {
        &self.pause
    }

    pub fn is_completed(&self) -> bool {
        self.current_phase().is_terminal()
    }

    /// Every phase attempt so far, oldest first.
    pub fn outcomes(&self) -> &[PhaseOutcome] {
        &self.outcomes
    }

    pub fn last_outcome(&self) -> Option<&PhaseOutcome> {
        self.outcomes.last()
    }

    pub fn history(&self) -> &[PhaseHistoryEntry] {
        self.tracker.history()
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            run_id: self.run_id,
            current_phase: self.current_phase(),
            paused: self.pause.is_paused(),
            pause_reason: self.pause.reason().map(str::to_string),
            registered_steps: self.registry.ids(),
        }
    }

    /// Whether `input` is the resume command (trimmed, case-insensitive).
    pub fn is_resume_signal(&self, input: &str) -> bool {
        input.trim().to_lowercase() == self.resume_phrase.to_lowercase()
    }

    /// Run the current phase once.
    pub fn advance(&mut self) -> Result<Advance> {
        self.ensure_runnable()?;
        self.run_current()
    }

    /// Feed one external input into the run.
    ///
    /// While paused only the resume phrase is accepted; anything else is
    /// rejected with the stored pause reason. Otherwise the input is stored
    /// under `user_input` and the current phase runs once.
    pub fn submit(&mut self, input: &str) -> Result<Advance> {
        if self.is_completed() {
            return Err(Error::WorkflowCompleted);
        }
        if self.pause.is_paused() {
            if self.is_resume_signal(input) {
                return self.resume();
            }
            return Err(self.paused_error());
        }
        self.context.set_input(input);
        self.run_current()
    }

    /// Clear the pause and re-run the paused phase from its first step.
    pub fn resume(&mut self) -> Result<Advance> {
        if self.is_completed() {
            return Err(Error::WorkflowCompleted);
        }
        if !self.pause.is_paused() {
            return Err(Error::NotPaused);
        }
        info!(
            phase = %self.current_phase(),
            reason = self.pause.reason().unwrap_or_default(),
            "resuming"
        );
        self.pause.clear();
        self.tracker.reenter();
        self.run_current()
    }

    /// Aggregate everything steps recorded so far into a validation report.
    pub fn validation_report(&self, aggregator: &OutcomeAggregator) -> ValidationReport {
        aggregator.aggregate_context(&self.context)
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.run_id,
            phase: self.current_phase(),
            pause: self.pause.clone(),
            registered_steps: self.registry.ids(),
            context: self.context.clone(),
            phase_history: self.tracker.history().to_vec(),
            outcomes: self.outcomes.clone(),
            saved_at: chrono::Utc::now(),
        }
    }

    fn ensure_runnable(&self) -> Result<()> {
        if self.is_completed() {
            return Err(Error::WorkflowCompleted);
        }
        if self.pause.is_paused() {
            return Err(self.paused_error());
        }
        Ok(())
    }

    fn paused_error(&self) -> Error {
        Error::Paused {
            reason: self.pause.reason().unwrap_or_default().to_string(),
        }
    }

    fn run_current(&mut self) -> Result<Advance> {
        let phase = self.current_phase();
        let outcome = PhaseRunner::new(&self.registry).run_phase(phase, &mut self.context);
        self.outcomes.push(outcome.clone());

        if outcome.success {
            if phase == Phase::Definition && !outcome.flag(keys::SCOPE_CONFIRMED) {
                info!("scope not confirmed; staying in definition");
                return Ok(Advance::Held { phase, outcome });
            }
            let next = phase.next().ok_or(Error::WorkflowCompleted)?;
            self.tracker.transition(next)?;
            info!(from = %phase, to = %next, "phase transition");
            return Ok(Advance::Advanced {
                from: phase,
                to: next,
                outcome,
            });
        }

        let step = outcome.failed_step.clone().unwrap_or_default();
        let failure = outcome
            .failure()
            .cloned()
            .unwrap_or_else(|| StepOutcome::failure(format!("phase {phase} failed")));

        match self.policy.classify(&failure) {
            FailureClass::Recoverable => {
                warn!(%phase, %step, reason = %failure.message, "recoverable failure; pausing");
                self.pause.pause(failure.message.clone());
                Ok(Advance::Paused {
                    phase,
                    reason: failure.message,
                    outcome,
                })
            }
            FailureClass::Terminal => {
                error!(%phase, %step, message = %failure.message, "phase failed");
                Err(Error::PhaseFailed {
                    phase,
                    step,
                    message: failure.message,
                })
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("run_id", &self.run_id)
            .field("phase", &self.current_phase())
            .field("pause", &self.pause)
            .field("steps", &self.registry.len())
            .finish_non_exhaustive()
    }
}
