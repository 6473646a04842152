//! Structured logging for debugging agentflow.
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber through [`init_with_debug`].
//!
//! Log levels:
//! - ERROR: Terminal phase failures
//! - WARN: Recoverable failures that pause the run, rejected inputs
//! - INFO: Phase transitions, pause/resume, run start and completion
//! - DEBUG: Per-step traces and context writes
//! - TRACE: Step payloads
//!
//! Debug mode can be enabled with `--debug` flag or `AGENTFLOW_DEBUG=1` env var.
//! `AGENTFLOW_LOG` overrides the filter entirely (EnvFilter syntax).

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::{Error, Result};

/// Environment variable that turns on debug logging.
pub const DEBUG_ENV: &str = "AGENTFLOW_DEBUG";

/// Environment variable holding an explicit filter directive.
pub const FILTER_ENV: &str = "AGENTFLOW_LOG";

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Path of the log file: ~/.agentflow/agentflow.log
pub fn log_path() -> Result<PathBuf> {
    Ok(Config::app_dir()?.join("agentflow.log"))
}

/// Initialize logging with explicit debug mode setting.
pub fn init_with_debug(debug: bool) -> Result<()> {
    let debug_enabled = debug || env_debug();
    DEBUG_ENABLED.store(debug_enabled, Ordering::SeqCst);

    let filter = EnvFilter::try_from_env(FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug_enabled)));

    let path = log_path()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    // Truncate file on startup
    let file = File::create(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Check if debug mode is enabled.
pub fn is_debug() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

fn env_debug() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "agentflow=debug"
    } else {
        "agentflow=info"
    }
}
