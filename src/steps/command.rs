//! External programs as pipeline steps.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::CommandStepConfig;
use crate::core::{Step, StepOutcome, WorkflowContext};
use crate::orchestration::Criterion;
use crate::util::tail;

const OUTPUT_TAIL_CHARS: usize = 2000;

/// Runs `program args...` and reports its exit status.
///
/// Without a criterion a non-zero exit fails the step as terminal, since its
/// output is free text that must not be read as an outage. With one, the
/// exit status becomes that criterion's finding and the step itself succeeds.
pub struct CommandStep {
    id: String,
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    criterion: Option<Criterion>,
}

impl CommandStep {
    pub fn new(id: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            criterion: None,
        }
    }

    pub fn from_config(config: &CommandStepConfig) -> Self {
        Self {
            id: config.id.clone(),
            program: config.program.clone(),
            args: config.args.clone(),
            cwd: None,
            criterion: config.criterion,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = Some(criterion);
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Step for CommandStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.program
    }

    fn execute(&self, _ctx: &mut WorkflowContext) -> StepOutcome {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        debug!(step = %self.id, cmd = %self.command_line(), "running command");

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return StepOutcome::unavailable(format!("{} unavailable: not found", self.program));
            }
            Err(e) => return StepOutcome::terminal(format!("failed to run {}: {e}", self.program)),
        };

        let stdout = tail(&String::from_utf8_lossy(&output.stdout), OUTPUT_TAIL_CHARS);
        let stderr = tail(&String::from_utf8_lossy(&output.stderr), OUTPUT_TAIL_CHARS);
        let code = output.status.code();
        let passed = output.status.success();

        if !passed {
            warn!(step = %self.id, ?code, "command exited unsuccessfully");
        }

        let base = |outcome: StepOutcome| {
            outcome
                .with_data("exit_code", code)
                .with_data("stdout", stdout.clone())
                .with_data("stderr", stderr.clone())
        };

        let detail = if stderr.is_empty() { &stdout } else { &stderr };
        let status = match code {
            Some(c) => format!("exit code {c}"),
            None => "terminated by signal".to_string(),
        };

        match self.criterion {
            Some(criterion) => {
                let issues: Vec<&str> = match (passed, detail.is_empty()) {
                    (true, _) => Vec::new(),
                    (false, true) => vec![status.as_str()],
                    (false, false) => vec![detail.as_str()],
                };
                let finding = json!({ "passed": passed, "issues": issues });
                base(StepOutcome::success(format!(
                    "{} {} ({criterion})",
                    self.program,
                    if passed { "passed" } else { "reported issues" }
                )))
                .with_data(criterion.as_str(), finding)
            }
            None if passed => base(StepOutcome::success(format!("{} succeeded", self.program))),
            None => base(StepOutcome::terminal(if detail.is_empty() {
                format!("{} failed with {status}", self.program)
            } else {
                format!("{} failed with {status}: {detail}", self.program)
            })),
        }
    }
}
