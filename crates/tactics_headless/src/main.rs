//! Headless battle runner.
//!
//! Runs encounters without a presentation layer. Reports go to stdout as
//! JSON, logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Play an encounter with the built-in AI on both sides
//! cargo run -p tactics_headless -- run encounters/skirmish.ron
//!
//! # Override difficulty and round limit, and check determinism
//! cargo run -p tactics_headless -- run encounters/skirmish.ron --difficulty easy --max-rounds 10 --verify
//!
//! # Validate encounter files
//! cargo run -p tactics_headless -- validate encounters/skirmish.ron encounters/ambush.ron
//!
//! # Print the starting map
//! cargo run -p tactics_headless -- render encounters/skirmish.ron
//! ```
//!
//! `RUST_LOG` overrides the log filter.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tactics_core::prelude::*;
use tactics_headless::{
    load_encounter, load_valid_encounter, render_battle, run_battle, verify_determinism, HeadlessError, RunConfig,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tactical battle runner for encounter testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an encounter and print a JSON report
    Run {
        /// Encounter file to load
        encounter: PathBuf,

        /// Difficulty (easy, normal or hard); defaults to the encounter's
        #[arg(short, long)]
        difficulty: Option<Difficulty>,

        /// Round limit; defaults to the encounter's
        #[arg(short, long)]
        max_rounds: Option<u32>,

        /// Play twice and fail if the runs differ
        #[arg(long)]
        verify: bool,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Check that encounter files parse and place units legally
    Validate {
        /// Encounter files to check
        #[arg(required = true)]
        encounters: Vec<PathBuf>,
    },

    /// Print an encounter's starting map
    Render {
        /// Encounter file to load
        encounter: PathBuf,

        /// Difficulty used to build the enemy roster
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr (stdout is for reports)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(true))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            encounter,
            difficulty,
            max_rounds,
            verify,
            pretty,
        } => cmd_run(&encounter, RunConfig { difficulty, max_rounds }, verify, pretty),
        Commands::Validate { encounters } => cmd_validate(&encounters),
        Commands::Render { encounter, difficulty } => cmd_render(&encounter, difficulty),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(path: &Path, config: RunConfig, verify: bool, pretty: bool) -> std::result::Result<ExitCode, HeadlessError> {
    let encounter = load_valid_encounter(path)?;

    if verify && !verify_determinism(&encounter, &config)? {
        tracing::error!(encounter = %encounter.name, "Non-deterministic run");
        return Ok(ExitCode::FAILURE);
    }

    let report = run_battle(&encounter, &config)?;
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(paths: &[PathBuf]) -> std::result::Result<ExitCode, HeadlessError> {
    let mut failures = 0;
    for path in paths {
        match load_valid_encounter(path) {
            Ok(encounter) => {
                tracing::info!(path = %path.display(), name = %encounter.name, "Encounter OK");
            }
            Err(e) => {
                failures += 1;
                tracing::error!(path = %path.display(), error = %e, "Encounter invalid");
            }
        }
    }

    tracing::info!(checked = paths.len(), failures, "Validation complete");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_render(path: &Path, difficulty: Option<Difficulty>) -> std::result::Result<ExitCode, HeadlessError> {
    let encounter = load_encounter(path)?;
    let battle = Battle::from_encounter(&encounter, difficulty.unwrap_or(encounter.difficulty))?;
    println!("{}", encounter.name);
    print!("{}", render_battle(&battle));
    Ok(ExitCode::SUCCESS)
}
