use thiserror::Error;

use crate::workflow::Phase;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("Step slot already occupied: phase {phase}, order {order}")]
    DuplicateStep { phase: Phase, order: u32 },

    #[error("Step id already registered: {0}")]
    DuplicateStepId(String),

    #[error("Step registry is sealed; no further registration allowed")]
    RegistryClosed,

    #[error("Cannot register step {id} against phase {phase}")]
    InvalidRegistration { id: String, phase: Phase },

    #[error("Phase {phase} failed at step {step}: {message}")]
    PhaseFailed {
        phase: Phase,
        step: String,
        message: String,
    },

    #[error("Workflow paused: {reason}")]
    Paused { reason: String },

    #[error("Workflow is not paused")]
    NotPaused,

    #[error("Workflow already completed")]
    WorkflowCompleted,

    #[error("Context key already holds a different value: {key}")]
    ContextConflict { key: String },

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}

impl Error {
    /// Registry misuse. These only occur while the pipeline is being assembled.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::DuplicateStep { .. }
                | Error::DuplicateStepId(_)
                | Error::RegistryClosed
                | Error::InvalidRegistration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
