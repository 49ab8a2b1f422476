use clap::Parser;
use colored::Colorize;
use decomposition::{Engine, EngineConfig, EngineErrors, OutputManager, TrajectoryReader};
use multibody::MultibodySystemBuilder;
use std::{path::PathBuf, process::ExitCode};

/// Decompose recorded joint-space dynamics into per-frame force
/// contributions and a residual consistency signal.
#[derive(Parser)]
#[command(name = "joint_space_forces")]
struct Cli {
    /// Multibody model description (RON).
    model: PathBuf,
    /// External-force stream (18 contact channels per frame).
    external_forces: PathBuf,
    /// Generalized-state stream (positions then velocities, radians).
    states: PathBuf,
    /// Generalized-acceleration stream (degrees on rotational DOFs).
    accelerations: PathBuf,
    /// Measured net joint torque stream.
    net_torques: PathBuf,
    /// Directory for the four output files.
    results_dir: PathBuf,
    /// Print per-frame contribution vectors (true/false/1/0).
    #[arg(value_parser = parse_verbose)]
    verbose: Option<bool>,
}

fn parse_verbose(value: &str) -> Result<bool, String> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("expected true, false, 1, or 0, got '{other}'")),
    }
}

fn run(cli: &Cli) -> Result<usize, EngineErrors> {
    let system = MultibodySystemBuilder::load(&cli.model)?.build()?;
    let config = EngineConfig::default();
    let engine = Engine::new(&system, config.clone(), cli.verbose.unwrap_or(false))?;
    let frames = TrajectoryReader::open(
        &system,
        &config,
        &cli.external_forces,
        &cli.states,
        &cli.accelerations,
        &cli.net_torques,
    )?;
    let mut outputs = OutputManager::new(&cli.results_dir)?;
    engine.run(frames, &mut outputs)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            println!("{e}");
            return ExitCode::from(1);
        }
    };
    match run(&cli) {
        Ok(frames) => {
            println!(
                "{}",
                format!("Decomposed {frames} frames.").green().bold()
            );
            println!("Now check the residual forces!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", e.to_string().red());
            ExitCode::from(1)
        }
    }
}
