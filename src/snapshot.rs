//! Persisted JSON view of a run, one file per run id.
//!
//! Snapshots are written after every event so `agentflow status` can report
//! on a run from another process. They are for inspection only; a run is
//! never rebuilt from one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::WorkflowContext;
use crate::orchestration::{PhaseOutcome, RunStatus};
use crate::workflow::{PauseState, Phase, PhaseHistoryEntry, RunId};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub phase: Phase,
    pub pause: PauseState,
    #[serde(default)]
    pub registered_steps: Vec<String>,
    pub context: WorkflowContext,
    pub phase_history: Vec<PhaseHistoryEntry>,
    pub outcomes: Vec<PhaseOutcome>,
    pub saved_at: DateTime<Utc>,
}

impl RunSnapshot {
    pub fn file_name(run_id: RunId) -> String {
        format!("{run_id}.json")
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            run_id: self.run_id,
            current_phase: self.phase,
            paused: self.pause.is_paused(),
            pause_reason: self.pause.reason().map(str::to_string),
            registered_steps: self.registered_steps.clone(),
        }
    }

    /// Write to `<dir>/<run_id>.json` through a temp file and rename.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.exists() {
            debug!(dir = %dir.display(), "Creating runs directory");
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(Self::file_name(self.run_id));
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(self)?)?;
        fs::rename(&temp_path, &path)?;
        debug!(path = %path.display(), phase = %self.phase, "Snapshot saved");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Load the snapshot of `run_id` from `dir`.
///
/// Anything that is not a run id is reported as not found.
pub fn find(dir: &Path, run_id: &str) -> Result<RunSnapshot> {
    let id: RunId = run_id
        .trim()
        .parse()
        .map_err(|_| Error::SnapshotNotFound(run_id.to_string()))?;
    let path = dir.join(RunSnapshot::file_name(id));
    if !path.exists() {
        return Err(Error::SnapshotNotFound(run_id.to_string()));
    }
    RunSnapshot::load(&path)
}

/// The most recently saved snapshot in `dir`, if any.
///
/// Unreadable files are skipped with a warning.
pub fn latest(dir: &Path) -> Result<Option<RunSnapshot>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut newest: Option<RunSnapshot> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match RunSnapshot::load(&path) {
            Ok(snapshot) => {
                if newest.as_ref().map_or(true, |n| snapshot.saved_at > n.saved_at) {
                    newest = Some(snapshot);
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot"),
        }
    }
    Ok(newest)
}
