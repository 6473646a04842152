//! Core workflow type definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Unique identifier for one orchestrated run.
///
/// Uses UUID v4 for generation and provides a short form display
/// for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new unique run identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Phases of the workflow pipeline.
///
/// Phases run strictly in declaration order:
/// 1. Setup - Verify the environment the other steps rely on
/// 2. Definition - Converse with the user until scope is confirmed
/// 3. Development - Architecture through final validation
/// 4. Delivery - Package and hand over the result
/// 5. Completed - Terminal, accepts no further input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Definition,
    Development,
    Delivery,
    Completed,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 5] = [
        Phase::Setup,
        Phase::Definition,
        Phase::Development,
        Phase::Delivery,
        Phase::Completed,
    ];

    /// The phase that follows this one, `None` for `Completed`.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Setup => Some(Phase::Definition),
            Phase::Definition => Some(Phase::Development),
            Phase::Development => Some(Phase::Delivery),
            Phase::Delivery => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Completed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Definition => "definition",
            Phase::Development => "development",
            Phase::Delivery => "delivery",
            Phase::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| Error::Validation(format!("unknown phase: {s}")))
    }
}

/// Canonical ordering of the Development phase.
///
/// Each stage gates the next: tests read what code generation wrote,
/// final validation reads what every earlier stage reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    Architecture,
    CodeGeneration,
    Backup,
    Standards,
    Tests,
    Documentation,
    Review,
    FinalValidation,
}

impl DevelopmentStage {
    pub const ALL: [DevelopmentStage; 8] = [
        DevelopmentStage::Architecture,
        DevelopmentStage::CodeGeneration,
        DevelopmentStage::Backup,
        DevelopmentStage::Standards,
        DevelopmentStage::Tests,
        DevelopmentStage::Documentation,
        DevelopmentStage::Review,
        DevelopmentStage::FinalValidation,
    ];

    /// Registry order slot for this stage.
    pub fn order(self) -> u32 {
        self as u32
    }
}

/// How the finished project is handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentChoice {
    Github,
    Executable,
    #[default]
    SourceOnly,
}

impl DeploymentChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentChoice::Github => "github",
            DeploymentChoice::Executable => "executable",
            DeploymentChoice::SourceOnly => "source_only",
        }
    }
}

impl std::fmt::Display for DeploymentChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeploymentChoice {
    type Err = Error;

    /// Accepts the variant name or its menu number (1-3).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "github" => Ok(DeploymentChoice::Github),
            "2" | "executable" => Ok(DeploymentChoice::Executable),
            "3" | "source_only" | "source-only" => Ok(DeploymentChoice::SourceOnly),
            other => Err(Error::Validation(format!(
                "unknown deployment choice: {other}"
            ))),
        }
    }
}

/// Pause overlay on the current phase.
///
/// Set when a step fails recoverably; cleared only by an explicit resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseState {
    pub paused: bool,
    pub reason: Option<String>,
}

impl PauseState {
    pub fn pause(&mut self, reason: impl Into<String>) {
        self.paused = true;
        self.reason = Some(reason.into());
    }

    pub fn clear(&mut self) {
        self.paused = false;
        self.reason = None;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
