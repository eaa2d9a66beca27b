//! Batch skirmish runner for balance testing.
//!
//! Runs many seeded skirmishes in parallel using rayon and aggregates win
//! rates per race.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use castle_core::castle::Race;
use castle_core::engine::Engine;
use castle_core::rules::RulesConfig;

use crate::error::Result;
use crate::skirmish::{run_skirmish, SkirmishConfig, SkirmishReport};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of skirmishes to run.
    pub games: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Castles per skirmish.
    pub castles: u64,
    /// Rounds per skirmish.
    pub rounds: u64,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Game rules.
    pub rules: RulesConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            games: 100,
            seed_start: 0,
            castles: 10,
            rounds: 60,
            parallel_games: 0,
            rules: RulesConfig::default(),
        }
    }
}

impl BatchConfig {
    fn skirmish(&self, index: u32) -> SkirmishConfig {
        SkirmishConfig {
            seed: self.seed_start.wrapping_add(u64::from(index)),
            castles: self.castles,
            rounds: self.rounds,
            rules: self.rules.clone(),
            ..Default::default()
        }
    }
}

/// Per-game summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Seed used.
    pub seed: u64,
    /// Battles fought.
    pub battles: u64,
    /// Commands the engine rejected.
    pub rejected_commands: u64,
    /// Final engine state hash.
    pub final_hash: u64,
    /// Battle wins per race, indexed by race id.
    pub wins: [u64; 5],
    /// Battles fought per race (attacking or defending), indexed by race id.
    pub fought: [u64; 5],
}

/// Aggregate statistics for one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceStats {
    /// Race.
    pub race: Race,
    /// Battles the race took part in.
    pub battles: u64,
    /// Battles the race won.
    pub wins: u64,
}

impl RaceStats {
    /// Win rate between 0.0 and 1.0 (0.5 when the race never fought).
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.battles == 0 {
            return 0.5;
        }
        self.wins as f64 / self.battles as f64
    }
}

/// Error during a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual game summaries, in seed order.
    pub games: Vec<GameSummary>,
    /// Per-race aggregates, in race id order.
    pub races: Vec<RaceStats>,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Games that failed to run.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or decoding fails.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn summarize(seed: u64, engine: &Engine, report: &SkirmishReport) -> GameSummary {
    let mut wins = [0; 5];
    let mut fought = [0; 5];
    let race_index = |id| {
        engine
            .castle(id)
            .map(|castle| usize::from(castle.race.id()))
    };

    for outcome in &report.outcomes {
        if let Some(index) = race_index(outcome.winner) {
            wins[index] += 1;
            fought[index] += 1;
        }
        if let Some(index) = race_index(outcome.loser) {
            fought[index] += 1;
        }
    }

    GameSummary {
        seed,
        battles: report.outcomes.len() as u64,
        rejected_commands: report.rejected_commands,
        final_hash: report.final_hash,
        wins,
        fought,
    }
}

/// Run a batch of skirmishes in parallel.
#[must_use]
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        games = config.games,
        castles = config.castles,
        rounds = config.rounds,
        "Starting batch"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<std::result::Result<GameSummary, BatchError>> = (0..config.games)
        .into_par_iter()
        .map(|index| {
            let skirmish_config = config.skirmish(index);
            let seed = skirmish_config.seed;
            match run_skirmish(&skirmish_config) {
                Ok(skirmish) => Ok(summarize(seed, &skirmish.engine, &skirmish.report)),
                Err(e) => {
                    warn!("Game {index} failed: {e}");
                    Err(BatchError {
                        game_index: index,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let mut games = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(game) => games.push(game),
            Err(error) => errors.push(error),
        }
    }

    let races = Race::ALL
        .into_iter()
        .map(|race| {
            let index = usize::from(race.id());
            RaceStats {
                race,
                battles: games.iter().map(|g| g.fought[index]).sum(),
                wins: games.iter().map(|g| g.wins[index]).sum(),
            }
        })
        .collect();

    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} games in {:.1}s, {} failed",
        games.len(),
        duration_seconds,
        errors.len()
    );

    BatchResults {
        config,
        games,
        races,
        duration_seconds,
        errors,
    }
}
