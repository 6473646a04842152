//! Built-in steps and the default pipeline assembled from configuration.

mod command;
mod scope;
mod tool_check;
mod validation;

pub use command::CommandStep;
pub use scope::ScopeStep;
pub use tool_check::ToolCheckStep;
pub use validation::ValidationStep;

use crate::config::Config;
use crate::core::StepRegistry;
use crate::workflow::{DevelopmentStage, Phase};
use crate::Result;

/// Assemble the default pipeline:
///
/// - Setup: tool check for `config.tools`
/// - Definition: the scope conversation
/// - every configured command step in its declared slot
/// - Development: the final validation gate, unless a command claims its slot
pub fn default_registry(config: &Config) -> Result<StepRegistry> {
    let mut registry = StepRegistry::new();
    registry.register(Phase::Setup, 0, ToolCheckStep::new("tools", config.tools.clone()))?;
    registry.register(Phase::Definition, 0, ScopeStep::default())?;

    for step in &config.steps {
        registry.register(step.phase, step.order, CommandStep::from_config(step))?;
    }

    let gate = DevelopmentStage::FinalValidation.order();
    let gate_taken = config
        .steps
        .iter()
        .any(|s| s.phase == Phase::Development && s.order == gate);
    if !gate_taken {
        registry.register_stage(
            DevelopmentStage::FinalValidation,
            ValidationStep::new("validate", config.aggregator()?),
        )?;
    }

    Ok(registry)
}
