//! Validation gate integration tests.
//!
//! These tests verify that findings recorded anywhere in a run reach the
//! final validation step, and that only critical issues block approval.

use serde_json::json;

use agentflow::config::{CommandStepConfig, Config};
use agentflow::core::{keys, FnStep, StepOutcome, StepRegistry, WorkflowContext};
use agentflow::orchestration::{Criterion, Orchestrator, OutcomeAggregator};
use agentflow::steps::{self, ValidationStep};
use agentflow::workflow::{DevelopmentStage, Phase};
use agentflow::Error;

use crate::fixtures::scope_confirmed;

fn pipeline_with_finding(finding: serde_json::Value) -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry
        .register(Phase::Definition, 0, FnStep::new("coordinator", |_ctx: &mut WorkflowContext| {
            scope_confirmed()
        }))
        .unwrap();
    registry
        .register_stage(
            DevelopmentStage::Standards,
            FnStep::new("standards", move |_ctx: &mut WorkflowContext| {
                StepOutcome::success("checked").with_data("code_quality", finding.clone())
            }),
        )
        .unwrap();
    registry
        .register_stage(
            DevelopmentStage::FinalValidation,
            ValidationStep::new("validate", OutcomeAggregator::default()),
        )
        .unwrap();
    registry
}

fn run_to_delivery(orchestrator: &mut Orchestrator) -> agentflow::Result<Phase> {
    orchestrator.advance()?;
    orchestrator.advance()?;
    Ok(orchestrator.advance()?.phase())
}

/// Test: Minor findings are advisory
/// Given a standards step reporting "3 minor style warnings"
/// When Development runs through the validation gate
/// Then the run moves on to Delivery with the issue as a recommendation
#[test]
fn test_minor_style_warnings_never_block() {
    let registry = pipeline_with_finding(json!({
        "passed": false,
        "issues": ["3 minor style warnings"]
    }));
    let mut orchestrator = Orchestrator::new(registry);

    assert_eq!(run_to_delivery(&mut orchestrator).unwrap(), Phase::Delivery);

    let report = orchestrator.validation_report(&OutcomeAggregator::default());
    assert!(report.approved);
    assert_eq!(report.recommendations, vec!["3 minor style warnings".to_string()]);
    assert!(orchestrator.context().step_data("validate").unwrap()["approved"]
        .as_bool()
        .unwrap());
}

/// Test: Critical findings block
/// Given a standards step reporting "syntax error in module X"
/// When Development runs through the validation gate
/// Then the phase fails terminally at the validation step
#[test]
fn test_syntax_error_always_blocks() {
    let registry = pipeline_with_finding(json!({
        "passed": false,
        "issues": ["syntax error in module X"]
    }));
    let mut orchestrator = Orchestrator::new(registry);

    match run_to_delivery(&mut orchestrator) {
        Err(Error::PhaseFailed { phase, step, message }) => {
            assert_eq!(phase, Phase::Development);
            assert_eq!(step, "validate");
            assert!(message.contains("syntax error in module X"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(orchestrator.current_phase(), Phase::Development);
    assert!(!orchestrator.is_paused());
}

/// Test: Rejection text mentioning an outage
/// Given a critical issue whose text contains "unavailable"
/// When Development runs through the validation gate
/// Then the phase fails terminally instead of pausing
#[test]
fn test_rejection_mentioning_outage_fails_instead_of_pausing() {
    let registry = pipeline_with_finding(json!({
        "passed": false,
        "issues": ["security vulnerability: auth bypass when token service unavailable"]
    }));
    let mut orchestrator = Orchestrator::new(registry);

    let err = run_to_delivery(&mut orchestrator).unwrap_err();
    assert!(matches!(err, Error::PhaseFailed { ref step, .. } if step == "validate"));
    assert!(!orchestrator.is_paused());
    assert_eq!(orchestrator.current_phase(), Phase::Development);
}

/// Test: Failing command output mentioning a timeout
/// Given a Setup command without a criterion whose stderr mentions "timeout"
/// When Setup runs
/// Then the phase fails terminally instead of pausing
#[cfg(unix)]
#[test]
fn test_failing_command_mentioning_timeout_does_not_pause() {
    let config = Config {
        steps: vec![CommandStepConfig {
            id: "pytest".into(),
            phase: Phase::Setup,
            order: 1,
            program: "sh".into(),
            args: vec![
                "-c".into(),
                "echo 'FAILED test_timeout_handling' >&2; exit 1".into(),
            ],
            criterion: None,
        }],
        ..Config::default()
    };
    let registry = steps::default_registry(&config).unwrap();
    let mut orchestrator = Orchestrator::from_config(registry, &config).unwrap();

    match orchestrator.advance() {
        Err(Error::PhaseFailed { step, message, .. }) => {
            assert_eq!(step, "pytest");
            assert!(message.contains("test_timeout_handling"));
        }
        other => panic!("expected terminal failure, got {other:?}"),
    }
    assert!(!orchestrator.is_paused());
    assert_eq!(orchestrator.current_phase(), Phase::Setup);
}

/// Test: Findings from validation_results
/// Given a collaborator writing the shared validation_results mapping
/// When the report is aggregated
/// Then those criteria count as recorded and unreported ones stay permissive
#[test]
fn test_validation_results_mapping_is_aggregated() {
    let mut registry = StepRegistry::new();
    registry
        .register(Phase::Setup, 0, FnStep::new("ethics", |ctx: &mut WorkflowContext| {
            ctx.upsert(
                keys::VALIDATION_RESULTS,
                json!({
                    "ethics": {"passed": true},
                    "security": {"passed": false, "recommendations": ["pin dependencies"]}
                }),
            );
            StepOutcome::success("reviewed")
        }))
        .unwrap();
    let mut orchestrator = Orchestrator::new(registry);
    orchestrator.advance().unwrap();

    let report = orchestrator.validation_report(&OutcomeAggregator::default());
    assert!(report.approved);
    assert!(report.criterion(Criterion::Ethics).unwrap().recorded);
    assert!(!report.criterion(Criterion::Security).unwrap().passed);
    assert!(report.recommendations.contains(&"pin dependencies".to_string()));
    let testing = report.criterion(Criterion::Testing).unwrap();
    assert!(testing.passed && !testing.recorded);
}

/// Test: Configured command steps feed the gate
/// Given a default pipeline with a failing test command reporting under "testing"
/// When the run reaches Development
/// Then the command step succeeds but validation rejects the critical issue
#[cfg(unix)]
#[test]
fn test_command_findings_reach_default_validation_gate() {
    let config = Config {
        steps: vec![CommandStepConfig {
            id: "pytest".into(),
            phase: Phase::Development,
            order: DevelopmentStage::Tests.order(),
            program: "sh".into(),
            args: vec!["-c".into(), "echo 'main.py: cannot run' >&2; exit 1".into()],
            criterion: Some(Criterion::Testing),
        }],
        ..Config::default()
    };
    let registry = steps::default_registry(&config).unwrap();
    let mut orchestrator = Orchestrator::from_config(registry, &config).unwrap();

    orchestrator.advance().unwrap();
    orchestrator.submit("a calculator").unwrap();
    orchestrator.submit("start development").unwrap();
    assert_eq!(orchestrator.current_phase(), Phase::Development);

    let err = orchestrator.advance().unwrap_err();
    assert!(matches!(err, Error::PhaseFailed { ref step, .. } if step == "validate"));
    let outcome = orchestrator.last_outcome().unwrap();
    assert_eq!(outcome.step_ids(), vec!["pytest", "validate"]);
    assert!(outcome.outcomes[0].outcome.success);
}
