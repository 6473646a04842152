use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use agentflow::config::Config;
use agentflow::orchestration::{Advance, Orchestrator};
use agentflow::workflow::{DeploymentChoice, Phase};
use agentflow::{snapshot, steps, Error, Result};

/// agentflow - phase-sequenced workflow orchestrator
#[derive(Parser, Debug)]
#[command(name = "agentflow")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    AGENTFLOW_DEBUG=1     Enable debug logging (alternative to --debug)\n    AGENTFLOW_LOG=<filter>  Override the log filter")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.agentflow/agentflow.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Config file (default: ~/.agentflow/agentflow.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a new run
    Run {
        /// Deployment target: github, executable, source_only (or 1, 2, 3)
        #[arg(long)]
        deploy: Option<String>,

        /// Scripted inputs, used in order instead of reading stdin
        #[arg(short = 'i', long = "input")]
        inputs: Vec<String>,
    },

    /// Show the status of a run as JSON
    Status {
        /// Run ID (uses latest if not specified)
        #[arg(long)]
        run: Option<String>,
    },

    /// Write the default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = agentflow::log::init_with_debug(cli.debug) {
        eprintln!("warning: logging disabled: {e}");
    }
    if agentflow::log::is_debug() {
        info!("agentflow starting (debug mode enabled)");
    } else {
        info!("agentflow starting");
    }

    match cli.command {
        Command::Init { force } => run_init(cli.config.as_deref(), force),
        Command::Run { deploy, inputs } => {
            let config = load_config(cli.config.as_deref())?;
            run_workflow(&config, deploy.as_deref(), inputs)
        }
        Command::Status { run } => {
            let config = load_config(cli.config.as_deref())?;
            run_status(&config, run.as_deref())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn run_init(custom: Option<&Path>, force: bool) -> Result<()> {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };
    if path.exists() && !force {
        println!("Config already exists: {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    let config = Config::default();
    match custom {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    config.ensure_dirs()?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Drive one run to completion, a terminal failure, or the end of input.
///
/// Setup, Development and Delivery advance on their own; Definition and a
/// paused run consume one input line per call.
fn run_workflow(config: &Config, deploy: Option<&str>, inputs: Vec<String>) -> Result<()> {
    config.ensure_dirs()?;
    let runs_dir = config.runs_dir()?;

    let registry = steps::default_registry(config)?;
    let mut orchestrator = Orchestrator::from_config(registry, config)?;
    if let Some(choice) = deploy {
        let choice: DeploymentChoice = choice.parse()?;
        orchestrator.context_mut().set_deployment_choice(choice);
    }

    info!(run = %orchestrator.run_id(), "run started");
    println!("Run {}", orchestrator.run_id());

    let mut lines: Box<dyn Iterator<Item = String>> = if inputs.is_empty() {
        Box::new(io::stdin().lines().map_while(|l| l.ok()))
    } else {
        Box::new(inputs.into_iter())
    };

    while !orchestrator.is_completed() {
        let needs_input =
            orchestrator.is_paused() || orchestrator.current_phase() == Phase::Definition;

        let result = if needs_input {
            let Some(line) = lines.next() else {
                println!(
                    "No more input; run left in phase {}",
                    orchestrator.current_phase()
                );
                break;
            };
            orchestrator.submit(&line)
        } else {
            orchestrator.advance()
        };

        orchestrator.snapshot().save(&runs_dir)?;

        match result {
            Ok(advance) => print_advance(&advance, config),
            Err(Error::Paused { reason }) => {
                println!("Paused: {reason} (say \"{}\" to resume)", config.resume_phrase);
            }
            Err(e) => return Err(e),
        }
    }

    if orchestrator.is_completed() {
        let report = orchestrator.validation_report(&config.aggregator()?);
        println!(
            "Completed: approved={} recommendations={}",
            report.approved,
            report.recommendations.len()
        );
        info!(run = %orchestrator.run_id(), "run completed");
    }
    Ok(())
}

fn print_advance(advance: &Advance, config: &Config) {
    match advance {
        Advance::Advanced { from, to, .. } => {
            println!("[{from}] done -> {to}");
            if *to == Phase::Definition {
                println!("Describe the project. Say \"start development\" when ready.");
            }
        }
        Advance::Held { phase, .. } => {
            if let Some(message) = advance.message() {
                println!("[{phase}] {message}");
            }
        }
        Advance::Paused { phase, reason, .. } => {
            println!(
                "[{phase}] Paused: {reason} (say \"{}\" to resume)",
                config.resume_phrase
            );
        }
    }
}

fn run_status(config: &Config, run: Option<&str>) -> Result<()> {
    let dir = config.runs_dir()?;
    let snapshot = match run {
        Some(id) => snapshot::find(&dir, id)?,
        None => snapshot::latest(&dir)?
            .ok_or_else(|| Error::SnapshotNotFound("no runs recorded".to_string()))?,
    };
    println!("{}", serde_json::to_string_pretty(&snapshot.status())?);
    Ok(())
}
