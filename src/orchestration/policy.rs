//! Classification of failed steps.
//!
//! A step may classify its own failure through the `failure_class` payload
//! key: an unavailable dependency pauses, a terminal failure never does.
//! Unclassified failures are recoverable when their message matches one of
//! the configured patterns (rate limits, timeouts, refused connections).
//! Recoverable failures pause the run; everything else fails the phase.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_RECOVERABLE_PATTERNS;
use crate::core::{StepOutcome, DEPENDENCY_UNAVAILABLE, TERMINAL_FAILURE};
use crate::util::KeywordMatcher;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// External dependency temporarily unavailable: pause and wait for resume.
    Recoverable,
    /// Anything else: surface to the caller, no transition.
    Terminal,
}

#[derive(Debug, Clone)]
pub struct FailurePolicy {
    recoverable: KeywordMatcher,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            recoverable: KeywordMatcher::new(DEFAULT_RECOVERABLE_PATTERNS)
                .unwrap_or_else(|_| KeywordMatcher::empty()),
        }
    }
}

impl FailurePolicy {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Ok(Self {
            recoverable: KeywordMatcher::new(patterns)?,
        })
    }

    /// Policy that treats every unclassified failure as terminal.
    pub fn strict() -> Self {
        Self {
            recoverable: KeywordMatcher::empty(),
        }
    }

    pub fn classify(&self, outcome: &StepOutcome) -> FailureClass {
        match outcome.failure_class() {
            Some(DEPENDENCY_UNAVAILABLE) => return FailureClass::Recoverable,
            Some(TERMINAL_FAILURE) => return FailureClass::Terminal,
            _ => {}
        }
        match self.recoverable.find(&outcome.message) {
            Some(keyword) => {
                debug!(%keyword, "failure message matches recoverable pattern");
                FailureClass::Recoverable
            }
            None => FailureClass::Terminal,
        }
    }

    pub fn patterns(&self) -> &[String] {
        self.recoverable.keywords()
    }
}
