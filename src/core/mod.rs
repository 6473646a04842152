//! Core domain models for agentflow orchestration.
//!
//! This module contains the step contract, the shared context steps read
//! and write, and the sealed registry that orders steps per phase.

pub mod context;
pub mod registry;
pub mod step;

pub use context::{keys, WorkflowContext};
pub use registry::{StepEntry, StepRegistry};
pub use step::{
    FnStep, Step, StepOutcome, DEPENDENCY_UNAVAILABLE, FAILURE_CLASS_KEY, TERMINAL_FAILURE,
};
