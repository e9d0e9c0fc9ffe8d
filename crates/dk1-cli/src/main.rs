//! `dk1` – command line front end for the bimanual DK1 composites.
//!
//! Sub-commands:
//!
//! - `init` writes an example `dk1.toml`.
//! - `features` prints the robot's observation/action schemas and the
//!   leader's action schema as JSON.
//! - `config-schema` prints the JSON schema of the session file.
//! - `teleop` connects both composites, runs the leader → follower loop and
//!   disconnects on exit or Ctrl-C.
//!
//! Drivers are the in-process simulated ones from `dk1-hal`.

mod config;
mod telemetry;
mod teleop;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dk1_bimanual::make_device;
use dk1_hal::SimFactory;
use serde_json::json;
use tracing::{error, warn};

use crate::config::SessionConfig;
use crate::teleop::TeleopOptions;

#[derive(Parser, Debug)]
#[command(name = "dk1", version, about = "Bimanual DK1 leader/follower tools")]
struct Cli {
    /// Session file (defaults to ./dk1.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an example session file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print feature schemas as JSON.
    Features,
    /// Print the JSON schema of the session file.
    ConfigSchema,
    /// Run leader → follower teleoperation.
    Teleop {
        /// Stop after this many control ticks.
        #[arg(long)]
        steps: Option<u64>,
        /// Override the session's control rate.
        #[arg(long)]
        fps: Option<u32>,
    },
}

fn main() -> ExitCode {
    let _guard = telemetry::init_tracing("dk1");
    let cli = Cli::parse();

    // Returning (not exiting) lets the tracer guard flush on failure too.
    ExitCode::from(exit_status(run(cli)))
}

/// Report a failed run and map it to the process exit status.
fn exit_status(result: Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %format!("{e:#}"), "dk1 failed");
            eprintln!("{}: {e:#}", "error".red().bold());
            1
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = config::config_path(cli.config.as_deref());
    match cli.command {
        Command::Init { force } => cmd_init(&path, force),
        Command::Features => cmd_features(&config::load_from(&path)?),
        Command::ConfigSchema => {
            let schema = schemars::schema_for!(SessionConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Command::Teleop { steps, fps } => {
            let mut session = config::load_from(&path)?;
            if let Some(fps) = fps {
                session.fps = fps;
            }
            session.validate()?;
            cmd_teleop(&session, steps)
        }
    }
}

fn cmd_init(path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config::save_to(&SessionConfig::example(), path)?;
    println!("  {} wrote {}", "✓".green().bold(), path.display().to_string().bold());
    Ok(())
}

fn cmd_features(session: &SessionConfig) -> Result<()> {
    let robot = make_device(&session.robot, &SimFactory).context("building robot")?;
    let teleop = make_device(&session.teleop, &SimFactory).context("building teleop")?;
    let out = json!({
        "robot": {
            "type": session.robot.name(),
            "observation_features": robot.observation_features(),
            "action_features": robot.as_device().action_features(),
        },
        "teleop": {
            "type": session.teleop.name(),
            "action_features": teleop.as_device().action_features(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_teleop(session: &SessionConfig, steps: Option<u64>) -> Result<()> {
    let mut follower = make_device(&session.robot, &SimFactory)?.into_follower()?;
    let mut leader = make_device(&session.teleop, &SimFactory)?.into_leader()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping teleoperation …".yellow().bold());
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; Ctrl-C will not disconnect cleanly");
    }

    let options = TeleopOptions {
        fps: session.fps,
        max_steps: steps,
    };
    let outcome = leader
        .connect()
        .and_then(|()| follower.connect())
        .and_then(|()| follower.configure())
        .and_then(|()| teleop::run(&mut leader, &mut follower, options, &shutdown));

    // Disconnect everything even when connect or the loop failed.
    let follower_down = follower.disconnect();
    let leader_down = leader.disconnect();

    let stats = outcome.context("teleoperation")?;
    follower_down.context("disconnecting robot")?;
    leader_down.context("disconnecting teleop")?;

    println!(
        "  {} {} ticks, {} limited value(s), slowest tick {:.1} ms",
        "✓".green().bold(),
        stats.steps,
        stats.limited_values,
        stats.slowest_tick.as_secs_f64() * 1e3
    );
    Ok(())
}
