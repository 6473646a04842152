pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod orchestration;
pub mod snapshot;
pub mod steps;
pub mod util;
pub mod workflow;

pub use config::Config;
pub use crate::core::{Step, StepOutcome, StepRegistry, WorkflowContext};
pub use error::{Error, Result};
pub use orchestration::{Advance, Orchestrator, OutcomeAggregator, RunStatus, ValidationReport};
pub use workflow::{Phase, RunId};
