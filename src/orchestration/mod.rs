//! Orchestration layer for agentflow.
//!
//! This module runs registered steps phase by phase, classifies failures
//! into pause-or-fail, drives the phase state machine with its pause
//! overlay, and aggregates step findings into the final validation report.

mod aggregator;
mod machine;
mod policy;
mod runner;

pub use aggregator::{Criterion, CriterionReport, Finding, OutcomeAggregator, ValidationReport};
pub use machine::{Advance, Orchestrator, RunStatus};
pub use policy::{FailureClass, FailurePolicy};
pub use runner::{PhaseOutcome, PhaseRunner, StepRecord};
