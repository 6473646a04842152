use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::orchestration::{Criterion, FailurePolicy, OutcomeAggregator};
use crate::workflow::{DeploymentChoice, Phase};
use crate::{Error, Result};

pub const DEFAULT_RESUME_PHRASE: &str = "try again";

pub const DEFAULT_RECOVERABLE_PATTERNS: &[&str] = &[
    "unavailable",
    "rate limit",
    "too many requests",
    "quota exceeded",
    "timeout",
    "timed out",
    "connection refused",
    "try again later",
];

pub const DEFAULT_CRITICAL_KEYWORDS: &[&str] = &[
    "syntax error",
    "compilation failed",
    "cannot run",
    "broken",
    "corrupted",
    "security vulnerability",
];

/// An external program run as a pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStepConfig {
    pub id: String,
    pub phase: Phase,
    pub order: u32,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Validation criterion the command's result is reported under.
    pub criterion: Option<Criterion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_resume_phrase")]
    pub resume_phrase: String,
    #[serde(default = "default_recoverable_patterns")]
    pub recoverable_patterns: Vec<String>,
    #[serde(default = "default_critical_keywords")]
    pub critical_keywords: Vec<String>,
    pub state_dir: Option<String>,
    #[serde(default)]
    pub deployment: DeploymentChoice,
    /// Executables the setup phase must find on PATH.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub steps: Vec<CommandStepConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resume_phrase: default_resume_phrase(),
            recoverable_patterns: default_recoverable_patterns(),
            critical_keywords: default_critical_keywords(),
            state_dir: None,
            deployment: DeploymentChoice::default(),
            tools: Vec::new(),
            steps: Vec::new(),
        }
    }
}

fn default_resume_phrase() -> String {
    DEFAULT_RESUME_PHRASE.to_string()
}

fn default_recoverable_patterns() -> Vec<String> {
    DEFAULT_RECOVERABLE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

fn default_critical_keywords() -> Vec<String> {
    DEFAULT_CRITICAL_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

impl Config {
    pub fn app_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".agentflow"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("agentflow.toml"))
    }

    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(expand_tilde(dir)),
            None => Self::app_dir(),
        }
    }

    /// Directory holding one JSON snapshot per run.
    pub fn runs_dir(&self) -> Result<PathBuf> {
        Ok(self.state_dir()?.join("runs"))
    }

    pub fn failure_policy(&self) -> Result<FailurePolicy> {
        FailurePolicy::new(&self.recoverable_patterns)
    }

    pub fn aggregator(&self) -> Result<OutcomeAggregator> {
        OutcomeAggregator::new(&self.critical_keywords)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Config::load");
        if !path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        debug!(
            resume_phrase = %config.resume_phrase,
            tools = config.tools.len(),
            steps = config.steps.len(),
            "Config loaded"
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                debug!(dir = %dir.display(), "Creating config directory");
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        let runs = self.runs_dir()?;
        if !runs.exists() {
            debug!(dir = %runs.display(), "Creating runs directory");
            fs::create_dir_all(&runs)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.resume_phrase.trim().is_empty() {
            return Err(Error::Validation("resume_phrase must not be empty".into()));
        }
        for step in &self.steps {
            if step.id.trim().is_empty() || step.program.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "command step in phase {} needs an id and a program",
                    step.phase
                )));
            }
        }
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
