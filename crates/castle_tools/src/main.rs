//! Castle engine command-line tools.
//!
//! # Usage
//!
//! ```bash
//! # Play one seeded skirmish, printing each battle as a JSON line
//! cargo run -p castle_tools -- skirmish --seed 7 --castles 12 --rounds 90
//!
//! # Run a parallel balance batch
//! cargo run -p castle_tools -- batch --games 500 --output results/batch.json
//!
//! # Inspect a snapshot or verify a replay
//! cargo run -p castle_tools -- inspect game.snap --owner player-3
//! cargo run -p castle_tools -- replay game.replay
//!
//! # Validate a rules file
//! cargo run -p castle_tools -- validate-rules rules.ron
//! ```
//!
//! Machine-readable output goes to stdout, logs to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use castle_tools::batch::{run_batch, BatchConfig};
use castle_tools::inspect::{inspect_snapshot, save_snapshot, verify_replay};
use castle_tools::skirmish::{run_skirmish, SkirmishConfig};
use castle_tools::validate::{rules_or_default, validate_rules_file};
use castle_tools::Result;

#[derive(Parser)]
#[command(name = "castle-tools")]
#[command(about = "Skirmish runner and tooling for the castle engine")]
#[command(version)]
struct Cli {
    /// Enable debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one seeded skirmish
    Skirmish {
        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Castles to register
        #[arg(long, default_value = "10")]
        castles: u64,

        /// One-minute rounds to play
        #[arg(long, default_value = "60")]
        rounds: u64,

        /// RON rules file (defaults apply when omitted)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Write the final engine snapshot here
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Write the command replay here
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Run many skirmishes in parallel and report race win rates
    Batch {
        /// Number of games
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Seed of the first game
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Castles per game
        #[arg(long, default_value = "10")]
        castles: u64,

        /// Rounds per game
        #[arg(long, default_value = "60")]
        rounds: u64,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// RON rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Write full results as JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the castles stored in a snapshot
    Inspect {
        /// Snapshot file
        path: PathBuf,

        /// Only show castles of this owner
        #[arg(long)]
        owner: Option<String>,
    },

    /// Re-run a replay and check it against its recorded hash
    Replay {
        /// Replay file
        path: PathBuf,
    },

    /// Validate a RON rules file
    ValidateRules {
        /// Rules file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Skirmish {
            seed,
            castles,
            rounds,
            rules,
            snapshot,
            replay,
        } => cmd_skirmish(
            SkirmishConfig {
                seed,
                castles,
                rounds,
                rules: rules_or_default(rules.as_deref())?,
                ..Default::default()
            },
            snapshot.as_deref(),
            replay.as_deref(),
        ),
        Commands::Batch {
            games,
            seed,
            castles,
            rounds,
            parallel,
            rules,
            output,
        } => cmd_batch(
            BatchConfig {
                games,
                seed_start: seed,
                castles,
                rounds,
                parallel_games: parallel,
                rules: rules_or_default(rules.as_deref())?,
            },
            output.as_deref(),
        ),
        Commands::Inspect { path, owner } => {
            let report = inspect_snapshot(&path, owner.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Replay { path } => {
            let check = verify_replay(&path)?;
            println!("{}", serde_json::to_string(&check)?);
            tracing::info!(commands = check.commands, "Replay verified");
            Ok(())
        }
        Commands::ValidateRules { path } => {
            tracing::info!("Validating rules file: {}", path.display());
            let rules = validate_rules_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
            tracing::info!("Validation passed");
            Ok(())
        }
    }
}

fn cmd_skirmish(
    config: SkirmishConfig,
    snapshot: Option<&Path>,
    replay: Option<&Path>,
) -> Result<()> {
    let skirmish = run_skirmish(&config)?;

    for outcome in &skirmish.report.outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    for castle in &skirmish.report.standings {
        println!("{}", serde_json::to_string(castle)?);
    }

    if let Some(path) = snapshot {
        save_snapshot(&skirmish.engine, path)?;
        tracing::info!("Snapshot written to {}", path.display());
    }
    if let Some(path) = replay {
        skirmish.replay.save(path)?;
        tracing::info!("Replay written to {}", path.display());
    }
    Ok(())
}

fn cmd_batch(config: BatchConfig, output: Option<&Path>) -> Result<()> {
    let results = run_batch(config);

    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("\nWin rates:");
    for stats in &results.races {
        eprintln!(
            "  {:<7} {:>5.1}% of {} battles",
            stats.race.display_name(),
            stats.win_rate() * 100.0,
            stats.battles
        );
    }

    println!("{}", serde_json::to_string(&results.races)?);

    if let Some(path) = output {
        results.save(path)?;
        eprintln!("\nResults saved to: {}", path.display());
    }
    Ok(())
}
