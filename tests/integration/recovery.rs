//! Pause and resume integration tests.
//!
//! These tests verify that recoverable step failures pause the run in
//! place, that paused runs reject everything but the resume phrase with
//! the stored reason, and that resuming restarts the phase from its
//! first step.

use agentflow::core::{StepOutcome, StepRegistry};
use agentflow::orchestration::{Advance, FailurePolicy, Orchestrator};
use agentflow::workflow::{Phase, PhaseEntry};
use agentflow::Error;

use crate::fixtures::{count, scope_confirmed, CallLog, ScriptedStep};

/// Test: Tool unavailable in Setup
/// Given A(Setup,0) succeeding and B(Setup,1) failing once with "tool unavailable"
/// When the run is advanced, fed a non-resume input, then resumed
/// Then it pauses with the verbatim reason, rejects the input, and re-runs A then B
#[test]
fn test_tool_unavailable_pauses_and_resume_reruns_phase() {
    let log = CallLog::new();
    let a = ScriptedStep::ok("A", &log);
    let b = ScriptedStep::failing_then_ok("B", &log, "tool unavailable", 1);
    let (a_calls, b_calls) = (a.counter(), b.counter());

    let mut registry = StepRegistry::new();
    registry.register(Phase::Setup, 0, a).unwrap();
    registry.register(Phase::Setup, 1, b).unwrap();
    let mut orchestrator = Orchestrator::new(registry);

    let result = orchestrator.advance().unwrap();
    match &result {
        Advance::Paused { phase, reason, outcome } => {
            assert_eq!(*phase, Phase::Setup);
            assert_eq!(reason, "tool unavailable");
            assert_eq!(outcome.failed_step.as_deref(), Some("B"));
        }
        other => panic!("expected pause, got {other:?}"),
    }
    assert_eq!(orchestrator.current_phase(), Phase::Setup);
    assert_eq!(
        orchestrator.pause_state().reason(),
        Some("tool unavailable")
    );

    match orchestrator.submit("what now?") {
        Err(Error::Paused { reason }) => assert_eq!(reason, "tool unavailable"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!((count(&a_calls), count(&b_calls)), (1, 1));

    log.clear();
    let result = orchestrator.submit("Try again").unwrap();
    assert_eq!(log.calls(), vec!["A", "B"]);
    assert_eq!(result.phase(), Phase::Definition);
    assert!(!orchestrator.is_paused());
    assert_eq!((count(&a_calls), count(&b_calls)), (2, 2));
}

/// Test: Pause during Development
/// Given a Development phase whose third step hits a rate limit once
/// When the run pauses and is resumed
/// Then Development restarts from its first step and completes
#[test]
fn test_development_pause_restarts_from_first_step() {
    let log = CallLog::new();
    let mut registry = StepRegistry::new();
    registry
        .register(Phase::Definition, 0, ScriptedStep::new("coordinator", &log, vec![scope_confirmed()]))
        .unwrap();
    registry.register(Phase::Development, 0, ScriptedStep::ok("arch", &log)).unwrap();
    registry.register(Phase::Development, 1, ScriptedStep::ok("core", &log)).unwrap();
    registry
        .register(
            Phase::Development,
            2,
            ScriptedStep::failing_then_ok("test", &log, "Rate limit reached, retry in 20s", 1),
        )
        .unwrap();
    registry.register(Phase::Development, 3, ScriptedStep::ok("doc", &log)).unwrap();
    let mut orchestrator = Orchestrator::new(registry);

    orchestrator.advance().unwrap();
    orchestrator.advance().unwrap();
    assert_eq!(orchestrator.current_phase(), Phase::Development);

    log.clear();
    let paused = orchestrator.advance().unwrap();
    assert!(paused.is_paused());
    assert_eq!(log.calls(), vec!["arch", "core", "test"]);
    assert_eq!(log.count("doc"), 0);

    log.clear();
    let resumed = orchestrator.resume().unwrap();
    assert_eq!(log.calls(), vec!["arch", "core", "test", "doc"]);
    assert_eq!(resumed.phase(), Phase::Delivery);

    let reentries = orchestrator
        .history()
        .iter()
        .filter(|h| h.phase == PhaseEntry::Reentered(Phase::Development))
        .count();
    assert_eq!(reentries, 1);
}

/// Test: Repeated pauses
/// Given a step that is unavailable three times in a row
/// When the caller keeps resuming
/// Then each resume re-pauses with the same reason until the step recovers
#[test]
fn test_repeated_pauses_until_recovery() {
    let log = CallLog::new();
    let mut registry = StepRegistry::new();
    registry
        .register(
            Phase::Setup,
            0,
            ScriptedStep::new(
                "model",
                &log,
                vec![
                    StepOutcome::unavailable("model gpt-4o-mini offline"),
                    StepOutcome::unavailable("model gpt-4o-mini offline"),
                    StepOutcome::unavailable("model gpt-4o-mini offline"),
                    StepOutcome::success("model ready"),
                ],
            ),
        )
        .unwrap();
    let mut orchestrator = Orchestrator::new(registry).with_policy(FailurePolicy::strict());

    assert!(orchestrator.advance().unwrap().is_paused());
    assert!(orchestrator.resume().unwrap().is_paused());
    assert!(orchestrator.resume().unwrap().is_paused());
    assert_eq!(
        orchestrator.status().pause_reason.as_deref(),
        Some("model gpt-4o-mini offline")
    );
    let result = orchestrator.resume().unwrap();
    assert_eq!(result.phase(), Phase::Definition);
    assert_eq!(log.count("model"), 4);
}

/// Test: Terminal failure
/// Given a step failing with a non-recoverable message
/// When the run is advanced
/// Then the failure is surfaced, the phase does not change, and the caller may retry
#[test]
fn test_terminal_failure_does_not_pause_or_transition() {
    let log = CallLog::new();
    let mut registry = StepRegistry::new();
    registry
        .register(
            Phase::Setup,
            0,
            ScriptedStep::failing_then_ok("venv", &log, "virtual environment is not active", 1),
        )
        .unwrap();
    let mut orchestrator = Orchestrator::new(registry);

    let err = orchestrator.advance().unwrap_err();
    assert!(matches!(err, Error::PhaseFailed { phase: Phase::Setup, ref step, .. } if step == "venv"));
    assert!(!orchestrator.is_paused());
    assert_eq!(orchestrator.current_phase(), Phase::Setup);
    assert!(matches!(orchestrator.resume(), Err(Error::NotPaused)));

    let retried = orchestrator.advance().unwrap();
    assert_eq!(retried.phase(), Phase::Definition);
    assert_eq!(orchestrator.outcomes().len(), 2);
}

/// Test: Status while paused
/// Given a paused run
/// When status is queried repeatedly
/// Then it is side-effect free and reports the pause
#[test]
fn test_status_query_while_paused_has_no_side_effects() {
    let log = CallLog::new();
    let mut registry = StepRegistry::new();
    registry
        .register(Phase::Setup, 0, ScriptedStep::failing_then_ok("net", &log, "connection refused", 1))
        .unwrap();
    let mut orchestrator = Orchestrator::new(registry);
    orchestrator.advance().unwrap();

    let first = orchestrator.status();
    let second = orchestrator.status();
    assert_eq!(first, second);
    assert!(first.paused);
    assert_eq!(first.pause_reason.as_deref(), Some("connection refused"));
    assert_eq!(log.count("net"), 1);
}
