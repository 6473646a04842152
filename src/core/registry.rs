//! Ordered catalog of steps per phase.
//!
//! The registry is filled once while the pipeline is assembled, then sealed
//! when an orchestrator takes ownership of it. After sealing every
//! registration attempt fails with [`Error::RegistryClosed`].

use tracing::debug;

use super::Step;
use crate::workflow::{DevelopmentStage, Phase};
use crate::{Error, Result};

/// A registered step and its slot in the pipeline.
pub struct StepEntry {
    pub id: String,
    pub phase: Phase,
    pub order: u32,
    step: Box<dyn Step>,
}

impl StepEntry {
    pub fn step(&self) -> &dyn Step {
        self.step.as_ref()
    }
}

impl std::fmt::Debug for StepEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEntry")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct StepRegistry {
    /// Kept sorted by `(phase, order)`.
    entries: Vec<StepEntry>,
    sealed: bool,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `step` at `(phase, order)`.
    ///
    /// # Errors
    /// - [`Error::RegistryClosed`] once the registry is sealed
    /// - [`Error::InvalidRegistration`] for the terminal `Completed` phase
    /// - [`Error::DuplicateStep`] if the slot is taken
    /// - [`Error::DuplicateStepId`] if another step already uses the id
    pub fn register<S: Step + 'static>(&mut self, phase: Phase, order: u32, step: S) -> Result<()> {
        self.register_boxed(phase, order, Box::new(step))
    }

    pub fn register_boxed(&mut self, phase: Phase, order: u32, step: Box<dyn Step>) -> Result<()> {
        let id = step.id().to_string();
        if self.sealed {
            return Err(Error::RegistryClosed);
        }
        if phase.is_terminal() {
            return Err(Error::InvalidRegistration { id, phase });
        }
        if self
            .entries
            .iter()
            .any(|e| e.phase == phase && e.order == order)
        {
            return Err(Error::DuplicateStep { phase, order });
        }
        if self.get(&id).is_some() {
            return Err(Error::DuplicateStepId(id));
        }

        debug!(step = %id, %phase, order, "registering step");
        let pos = self
            .entries
            .partition_point(|e| (e.phase, e.order) < (phase, order));
        self.entries.insert(
            pos,
            StepEntry {
                id,
                phase,
                order,
                step,
            },
        );
        Ok(())
    }

    /// Register a Development step in its canonical stage slot.
    pub fn register_stage<S: Step + 'static>(&mut self, stage: DevelopmentStage, step: S) -> Result<()> {
        self.register(Phase::Development, stage.order(), step)
    }

    /// Close the registry to further registration. Idempotent.
    pub fn seal(&mut self) {
        if !self.sealed {
            debug!(steps = self.entries.len(), "sealing step registry");
        }
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Steps of `phase`, sorted by order. Empty if the phase has none.
    pub fn steps_for(&self, phase: Phase) -> Vec<&StepEntry> {
        self.entries.iter().filter(|e| e.phase == phase).collect()
    }

    pub fn get(&self, id: &str) -> Option<&StepEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All step ids in pipeline order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
