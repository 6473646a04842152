//! Phase tracking with transition validation.
//!
//! `PhaseTracker` owns the current phase of a run and refuses any transition
//! other than a single step forward in the fixed phase order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Phase;

/// A record of a phase transition with timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseHistoryEntry {
    /// The phase that was entered.
    pub phase: PhaseEntry,
    /// When this phase was entered.
    pub entered_at: DateTime<Utc>,
}

/// Why a history entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "phase")]
pub enum PhaseEntry {
    /// Forward transition into the phase.
    Entered(Phase),
    /// Re-entry of the same phase after a resume.
    Reentered(Phase),
}

impl PhaseEntry {
    pub fn phase(&self) -> Phase {
        match self {
            PhaseEntry::Entered(p) | PhaseEntry::Reentered(p) => *p,
        }
    }
}

/// Tracks the current phase and enforces the strict phase order:
///
/// Setup -> Definition -> Development -> Delivery -> Completed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTracker {
    current: Phase,
    history: Vec<PhaseHistoryEntry>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    /// Start a tracker at `Setup`, recorded as the first history entry.
    pub fn new() -> Self {
        Self {
            current: Phase::Setup,
            history: vec![PhaseHistoryEntry {
                phase: PhaseEntry::Entered(Phase::Setup),
                entered_at: Utc::now(),
            }],
        }
    }

    /// Only the immediate successor of the current phase is reachable.
    pub fn can_transition(&self, target: Phase) -> bool {
        self.current.next() == Some(target)
    }

    /// Move to `target`, failing if it is not the next phase in order.
    pub fn transition(&mut self, target: Phase) -> Result<()> {
        if !self.can_transition(target) {
            return Err(Error::InvalidPhaseTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            });
        }

        self.current = target;
        self.history.push(PhaseHistoryEntry {
            phase: PhaseEntry::Entered(target),
            entered_at: Utc::now(),
        });

        Ok(())
    }

    /// Record a re-entry of the current phase. The phase itself is unchanged.
    pub fn reenter(&mut self) {
        self.history.push(PhaseHistoryEntry {
            phase: PhaseEntry::Reentered(self.current),
            entered_at: Utc::now(),
        });
    }

    pub fn current_phase(&self) -> Phase {
        self.current
    }

    /// History of all phases visited, in order.
    pub fn history(&self) -> &[PhaseHistoryEntry] {
        &self.history
    }
}
