//! Seeded skirmishes.
//!
//! A skirmish registers a roster of castles and plays a fixed number of
//! one-minute rounds. Every round each castle, in id order, settles, spends
//! its treasury on soldiers, upgrades and attacks a random opponent. All
//! commands go through a [`Replay`] so the game can be saved and re-run.

use serde::{Deserialize, Serialize};

use castle_core::castle::{CastleId, CastleRecord, CastleSize, Race, Timestamp};
use castle_core::combat::BattleOutcome;
use castle_core::economy::minutes;
use castle_core::engine::{CommandResult, Engine, EngineCommand};
use castle_core::random::{RandomSource, SeededRandom};
use castle_core::replay::Replay;
use castle_core::rules::RulesConfig;

use crate::error::{Result, ToolError};

/// Configuration for a single skirmish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkirmishConfig {
    /// Seed for the roster and the engine's opponent draws.
    pub seed: u64,
    /// Number of castles to register.
    pub castles: u64,
    /// Number of one-minute rounds.
    pub rounds: u64,
    /// Most soldiers a castle buys per round.
    pub recruit_per_round: u64,
    /// Game rules.
    pub rules: RulesConfig,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            castles: 10,
            rounds: 60,
            recruit_per_round: 5,
            rules: RulesConfig::default(),
        }
    }
}

impl SkirmishConfig {
    /// Reject configurations that cannot produce a game.
    ///
    /// # Errors
    ///
    /// [`ToolError::Config`] with fewer than two castles, or if the rules are
    /// invalid.
    pub fn validate(&self) -> Result<()> {
        if self.castles < 2 {
            return Err(ToolError::Config(format!(
                "a skirmish needs at least 2 castles, got {}",
                self.castles
            )));
        }
        self.rules.validate()?;
        Ok(())
    }
}

/// Public view of a castle at the end of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastleSummary {
    /// Castle id.
    pub id: CastleId,
    /// Serial number.
    pub serial: String,
    /// Owner handle.
    pub owner: String,
    /// Castle name.
    pub name: String,
    /// Size class.
    pub size: CastleSize,
    /// Race.
    pub race: Race,
    /// Level.
    pub level: u8,
    /// Unspent experience.
    pub experience: u64,
    /// Stationed soldiers.
    pub soldiers: u64,
    /// Settled treasury.
    pub treasury: u64,
    /// Base economic power.
    pub economic_power: u64,
    /// Net income per minute as of the last settlement.
    pub income_per_minute: i64,
    /// Active plunder buffs and reparation debuffs.
    pub active_battle_buffs: usize,
}

impl From<&CastleRecord> for CastleSummary {
    fn from(castle: &CastleRecord) -> Self {
        Self {
            id: castle.id,
            serial: castle.serial_number(),
            owner: castle.owner.clone(),
            name: castle.name.clone(),
            size: castle.size,
            race: castle.race,
            level: castle.level,
            experience: castle.experience_pool,
            soldiers: castle.military.soldiers,
            treasury: castle.economy.treasury,
            economic_power: castle.economy.base_power,
            income_per_minute: castle
                .economy
                .income_per_minute(castle.economy.settle_time)
                .clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
            active_battle_buffs: castle.economy.battle_buffs.len(),
        }
    }
}

/// Summaries of every castle in id order.
#[must_use]
pub fn standings(engine: &Engine) -> Vec<CastleSummary> {
    engine
        .registry()
        .sorted_ids()
        .into_iter()
        .filter_map(|id| engine.castle(id))
        .map(CastleSummary::from)
        .collect()
}

/// Result of a skirmish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkirmishReport {
    /// Seed used.
    pub seed: u64,
    /// Battles fought, in order.
    pub outcomes: Vec<BattleOutcome>,
    /// Commands the engine rejected (cooldowns, short treasuries, ...).
    pub rejected_commands: u64,
    /// Final engine state hash.
    pub final_hash: u64,
    /// Final castle standings.
    pub standings: Vec<CastleSummary>,
}

/// A finished skirmish: the report, the final engine and the recorded replay.
#[derive(Debug, Clone)]
pub struct Skirmish {
    /// Summary of the game.
    pub report: SkirmishReport,
    /// Engine state at the end of the game.
    pub engine: Engine,
    /// Every command issued, ready to save.
    pub replay: Replay,
}

/// Play a skirmish.
///
/// # Errors
///
/// [`ToolError::Config`] for invalid configurations, or an engine error if a
/// roster castle cannot be registered.
pub fn run_skirmish(config: &SkirmishConfig) -> Result<Skirmish> {
    config.validate()?;

    let mut replay = Replay::new(config.seed, config.rules.clone());
    let mut engine = replay.initial_engine();
    let mut roster_rng = SeededRandom::new(config.seed);

    for i in 0..config.castles {
        let size = CastleSize::ALL[(i % 3) as usize];
        let race = Race::ALL[roster_rng.next_index(5) as usize];
        let command = EngineCommand::Register {
            owner: format!("player-{i}"),
            name: format!("{} keep {i}", race.display_name()),
            size,
            race,
        };
        replay.execute(&mut engine, command, 0)?;
    }

    let mut outcomes = Vec::new();
    let mut rejected_commands = 0;

    for round in 1..=config.rounds {
        let now = minutes(round);
        for id in engine.registry().sorted_ids() {
            for command in round_commands(&engine, id, now, config) {
                match replay.execute(&mut engine, command, now) {
                    Ok(CommandResult::Battle(outcome)) => outcomes.push(outcome),
                    Ok(_) => {}
                    Err(err) => {
                        tracing::debug!(castle = id.0, round, %err, "Command rejected");
                        rejected_commands += 1;
                    }
                }
            }
        }
    }

    replay.finalize(&engine);
    let final_hash = engine.state_hash();
    tracing::info!(
        seed = config.seed,
        battles = outcomes.len(),
        rejected_commands,
        final_hash,
        "Skirmish complete"
    );

    let report = SkirmishReport {
        seed: config.seed,
        outcomes,
        rejected_commands,
        final_hash,
        standings: standings(&engine),
    };
    Ok(Skirmish {
        report,
        engine,
        replay,
    })
}

/// Commands one castle issues in a round.
fn round_commands(
    engine: &Engine,
    id: CastleId,
    now: Timestamp,
    config: &SkirmishConfig,
) -> Vec<EngineCommand> {
    let mut commands = vec![EngineCommand::Settle(id)];

    if let Some(castle) = engine.castle(id) {
        let price = config.rules.soldier_price.max(1);
        let affordable = castle.economy.projected_treasury(now) / price;
        let room = castle
            .size
            .max_soldiers()
            .saturating_sub(castle.military.soldiers);
        let count = affordable.min(room).min(config.recruit_per_round);
        if count > 0 {
            commands.push(EngineCommand::Recruit { castle: id, count });
        }
    }

    commands.push(EngineCommand::Upgrade(id));
    commands.push(EngineCommand::Battle(id));
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> SkirmishConfig {
        SkirmishConfig {
            seed,
            castles: 6,
            rounds: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_skirmish_is_deterministic() {
        let a = run_skirmish(&small_config(4)).unwrap();
        let b = run_skirmish(&small_config(4)).unwrap();
        assert_eq!(a.report.final_hash, b.report.final_hash);
        assert_eq!(a.report.outcomes, b.report.outcomes);
    }

    #[test]
    fn test_skirmish_fights_battles() {
        let skirmish = run_skirmish(&small_config(1)).unwrap();
        assert!(!skirmish.report.outcomes.is_empty());
        assert_eq!(skirmish.report.standings.len(), 6);
    }

    #[test]
    fn test_replay_reproduces_skirmish() {
        let skirmish = run_skirmish(&small_config(9)).unwrap();
        let replayed = skirmish.replay.run().unwrap();
        assert_eq!(replayed.state_hash(), skirmish.report.final_hash);
    }

    #[test]
    fn test_rejects_lonely_skirmish() {
        let config = SkirmishConfig {
            castles: 1,
            ..Default::default()
        };
        assert!(matches!(run_skirmish(&config), Err(ToolError::Config(_))));
    }

    #[test]
    fn test_summary_uses_serial_number() {
        let skirmish = run_skirmish(&small_config(2)).unwrap();
        let first = &skirmish.report.standings[0];
        assert!(first.serial.starts_with('1'));
        assert!(first.serial.ends_with("00000001"));
    }
}
