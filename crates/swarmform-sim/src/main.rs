//! # swarmform-sim
//!
//! Runs a simulated formation flight and optionally saves the position
//! history.
//!
//! - Default: real-time session with mocap and pilot threads
//! - `--lockstep`: deterministic fixed-step rollout on a virtual clock

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use swarmform_sim::{run_session, LockstepRollout, SessionConfig};
use swarmform_core::control::DisturbanceMode;

/// Simulated fixed-time formation flight
#[derive(Parser)]
#[command(name = "swarmform-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Session config (JSON); defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fly agents 1..=N instead of the configured ids
    #[arg(short, long)]
    agents: Option<u32>,

    /// Formation phase duration [s]
    #[arg(long)]
    run_time: Option<f64>,

    /// Inject the bounded disturbance into every command
    #[arg(long)]
    disturbed: bool,

    /// Directory for the timestamped position history
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Deterministic fixed-step rollout instead of real-time threads
    #[arg(long)]
    lockstep: bool,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("Failed to load session config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    if let Some(n) = cli.agents {
        config.agents = (1..=n).collect();
    }
    if let Some(run_time) = cli.run_time {
        config.run_time = run_time;
    }
    if cli.disturbed && config.disturbance_gain.is_none() {
        config.disturbance_gain = Some(DisturbanceMode::DEFAULT_GAIN);
    }
    if let Some(dir) = &cli.export_dir {
        config.export_dir = Some(dir.clone());
    }

    config.validate().context("Invalid session config")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = load_config(&cli)?;
    info!(agents = ?config.agents, run_time = config.run_time, lockstep = cli.lockstep, "starting session");

    if cli.lockstep {
        let mut rollout = LockstepRollout::new(&config).context("Failed to set up rollout")?;
        let report = rollout
            .run(config.run_time)
            .context("Rollout stopped on a control error")?;
        if report.saturated_steps > 0 {
            warn!(steps = report.saturated_steps, "commands were saturated");
        }
        info!(
            steps = report.steps,
            initial_mismatch = report.initial_mismatch,
            final_mismatch = report.final_mismatch,
            "rollout complete"
        );
        if let Some(path) = rollout.export(&config).context("Failed to export history")? {
            println!("{}", path.display());
        }
    } else {
        let report = run_session(&config).context("Session stopped on a control error")?;
        for pilot in &report.pilots {
            info!(
                agent_id = pilot.agent_id,
                commands = pilot.commands,
                saturated = pilot.saturated,
                "pilot summary"
            );
        }
        if let Some(path) = &report.export_path {
            println!("{}", path.display());
        }
    }

    Ok(())
}
