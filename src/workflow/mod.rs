//! Workflow phase types for the agentflow orchestrator.
//!
//! This module provides the fixed phase order, the pause overlay and the
//! tracker that validates every phase transition.

mod state;
mod types;

pub use state::{PhaseEntry, PhaseHistoryEntry, PhaseTracker};
pub use types::{DeploymentChoice, DevelopmentStage, PauseState, Phase, RunId};
