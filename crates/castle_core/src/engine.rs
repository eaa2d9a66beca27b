//! The castle engine facade.
//!
//! [`Engine`] owns the registry, the rules and the random source, and exposes
//! one method per player operation. Every method takes `&mut self`, so one
//! operation always runs to completion before another can observe the
//! registry. Failed operations leave the engine untouched.
//!
//! # Example
//!
//! ```
//! use castle_core::castle::{CastleSize, Race};
//! use castle_core::economy::minutes;
//! use castle_core::engine::Engine;
//!
//! let mut engine = Engine::with_seed(7);
//! let keep = engine
//!     .register_new("alice", "Keep", CastleSize::Small, Race::Human, 0)
//!     .unwrap();
//!
//! engine.settle(keep, minutes(1)).unwrap();
//! assert_eq!(engine.castle(keep).unwrap().economy.treasury, 110);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::castle::{CastleId, CastleRecord, CastleSize, Race, Timestamp};
use crate::combat::{self, BattleOutcome};
use crate::economy::Settlement;
use crate::error::{CastleError, Result};
use crate::progression;
use crate::random::{RandomSource, SeededRandom};
use crate::registry::CastleRegistry;
use crate::rules::RulesConfig;

/// A player operation, as recorded in replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineCommand {
    /// Build a new castle.
    Register {
        /// Owner handle.
        owner: String,
        /// Castle name.
        name: String,
        /// Size class.
        size: CastleSize,
        /// Race.
        race: Race,
    },
    /// Materialize accrued currency.
    Settle(CastleId),
    /// Buy soldiers.
    Recruit {
        /// Castle recruiting.
        castle: CastleId,
        /// Soldiers to buy.
        count: u64,
    },
    /// Spend experience on levels.
    Upgrade(CastleId),
    /// Attack a random opponent.
    Battle(CastleId),
}

/// What a successful command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandResult {
    /// A castle was registered.
    Registered(CastleId),
    /// Settlement finished.
    Settled,
    /// Soldiers were recruited.
    Recruited,
    /// Levels gained by an upgrade.
    Upgraded(u8),
    /// A battle was fought.
    Battle(BattleOutcome),
}

/// The castle economy and battle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    registry: CastleRegistry,
    rules: RulesConfig,
    rng: SeededRandom,
}

impl Engine {
    /// Create an engine with the given rules and random seed.
    #[must_use]
    pub fn new(rules: RulesConfig, seed: u64) -> Self {
        Self {
            registry: CastleRegistry::new(),
            rules,
            rng: SeededRandom::new(seed),
        }
    }

    /// Create an engine with default rules.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::new(RulesConfig::default(), seed)
    }

    /// The castle registry.
    #[must_use]
    pub fn registry(&self) -> &CastleRegistry {
        &self.registry
    }

    /// Active rules.
    #[must_use]
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Look up a castle.
    #[must_use]
    pub fn castle(&self, id: CastleId) -> Option<&CastleRecord> {
        self.registry.get(id)
    }

    fn castle_mut(&mut self, id: CastleId) -> Result<&mut CastleRecord> {
        self.registry.get_mut(id).ok_or(CastleError::NotFound(id))
    }

    /// Build a new level-1 castle.
    ///
    /// # Errors
    ///
    /// [`CastleError::CapacityExceeded`] when the size class is full.
    pub fn register_new(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        size: CastleSize,
        race: Race,
        now: Timestamp,
    ) -> Result<CastleId> {
        if !self.registry.has_capacity(size) {
            return Err(CastleError::CapacityExceeded {
                size,
                limit: size.population_cap(),
            });
        }
        let id = self.registry.allocate_id();
        let record = CastleRecord::new(id, owner, name, size, race, now);
        let id = self.registry.register(record)?;
        tracing::info!(
            castle = id.0,
            size = size.display_name(),
            race = race.display_name(),
            "Castle registered"
        );
        Ok(id)
    }

    /// Materialize accrued currency up to `now`.
    ///
    /// # Errors
    ///
    /// [`CastleError::NotFound`], or [`CastleError::Validation`] if `now` is
    /// earlier than the castle's last settlement.
    pub fn settle(&mut self, id: CastleId, now: Timestamp) -> Result<Settlement> {
        let castle = self.castle_mut(id)?;
        ensure_not_before(castle, now)?;
        let settlement = castle.economy.settle(now);
        tracing::debug!(
            castle = id.0,
            credited = settlement.credited,
            debited = settlement.debited,
            treasury = castle.economy.treasury,
            "Castle settled"
        );
        Ok(settlement)
    }

    /// Buy `count` soldiers at the rules' soldier price.
    ///
    /// The castle is settled first so the treasury reflects everything earned
    /// up to `now`. Changes are staged on a copy and only committed on success.
    ///
    /// # Errors
    ///
    /// [`CastleError::SoldierCapExceeded`], [`CastleError::InsufficientTreasury`],
    /// [`CastleError::NotFound`], [`CastleError::Validation`].
    pub fn recruit(&mut self, id: CastleId, count: u64, now: Timestamp) -> Result<()> {
        let price = self.rules.soldier_price;
        let castle = self.castle_mut(id)?;
        ensure_not_before(castle, now)?;
        if count == 0 {
            return Err(CastleError::Validation(
                "recruit count must be positive".to_string(),
            ));
        }

        let limit = castle.size.max_soldiers();
        let current = castle.military.soldiers;
        if count > limit.saturating_sub(current) {
            return Err(CastleError::SoldierCapExceeded {
                current,
                requested: count,
                limit,
            });
        }

        let mut staged = castle.clone();
        staged.economy.settle(now);
        staged.economy.spend(count.saturating_mul(price))?;
        staged.set_soldiers(current + count);
        *castle = staged;

        tracing::debug!(
            castle = id.0,
            recruited = count,
            soldiers = castle.military.soldiers,
            treasury = castle.economy.treasury,
            "Soldiers recruited"
        );
        Ok(())
    }

    /// Spend pooled experience on levels. Returns the number of levels gained.
    ///
    /// # Errors
    ///
    /// [`CastleError::NotFound`].
    pub fn upgrade(&mut self, id: CastleId) -> Result<u8> {
        let castle = self.castle_mut(id)?;
        Ok(progression::upgrade(castle))
    }

    /// Attack a random opponent using the engine's own random source.
    ///
    /// # Errors
    ///
    /// See [`Engine::battle_with`].
    pub fn battle(&mut self, attacker: CastleId, now: Timestamp) -> Result<BattleOutcome> {
        // Draws only count once the battle succeeds.
        let mut rng = self.rng.clone();
        let outcome = self.battle_with(attacker, now, &mut rng)?;
        self.rng = rng;
        Ok(outcome)
    }

    /// Attack an opponent drawn from `rng`.
    ///
    /// # Errors
    ///
    /// [`CastleError::NotFound`], [`CastleError::InsufficientPopulation`],
    /// [`CastleError::TargetSelectionExhausted`], [`CastleError::OnCooldown`],
    /// [`CastleError::Validation`].
    pub fn battle_with(
        &mut self,
        attacker: CastleId,
        now: Timestamp,
        rng: &mut dyn RandomSource,
    ) -> Result<BattleOutcome> {
        if self.registry.get(attacker).is_none() {
            return Err(CastleError::NotFound(attacker));
        }

        let defender = self
            .registry
            .random_other(attacker, rng, self.rules.max_target_draws)?;

        for id in [attacker, defender] {
            let castle = self.registry.get(id).ok_or(CastleError::NotFound(id))?;
            combat::ensure_ready(castle, now)?;
            ensure_not_before(castle, now)?;
        }

        let mut attacking = self.registry.remove(attacker)?;
        let mut defending = match self.registry.remove(defender) {
            Ok(record) => record,
            Err(err) => {
                self.registry.reinsert(attacking)?;
                return Err(err);
            }
        };

        let outcome = combat::resolve(&mut attacking, &mut defending, now, &self.rules);

        self.registry.reinsert(attacking)?;
        self.registry.reinsert(defending)?;

        tracing::info!(
            attacker = outcome.attacker.0,
            defender = outcome.defender.0,
            winner = outcome.winner.0,
            winner_soldiers_lost = outcome.winner_soldiers_lost,
            loser_soldiers_lost = outcome.loser_soldiers_lost,
            reparation = outcome.reparation_economic_power,
            "Battle resolved"
        );
        Ok(outcome)
    }

    /// Execute a recorded command at `now`.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation returns.
    pub fn apply(&mut self, command: &EngineCommand, now: Timestamp) -> Result<CommandResult> {
        match command {
            EngineCommand::Register {
                owner,
                name,
                size,
                race,
            } => self
                .register_new(owner.clone(), name.clone(), *size, *race, now)
                .map(CommandResult::Registered),
            EngineCommand::Settle(id) => self.settle(*id, now).map(|_| CommandResult::Settled),
            EngineCommand::Recruit { castle, count } => self
                .recruit(*castle, *count, now)
                .map(|()| CommandResult::Recruited),
            EngineCommand::Upgrade(id) => self.upgrade(*id).map(CommandResult::Upgraded),
            EngineCommand::Battle(id) => self.battle(*id, now).map(CommandResult::Battle),
        }
    }

    /// Deterministic hash of every castle, the rules and the random state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for id in self.registry.sorted_ids() {
            if let Some(castle) = self.registry.get(id) {
                castle.hash(&mut hasher);
            }
        }
        for size in CastleSize::ALL {
            self.registry.population(size).hash(&mut hasher);
        }
        self.registry.ids().hash(&mut hasher);
        self.rng.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the engine state for snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CastleError::InvalidState(format!("Failed to serialize engine: {e}")))
    }

    /// Restore engine state from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| CastleError::InvalidState(format!("Failed to deserialize engine: {e}")))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

fn ensure_not_before(castle: &CastleRecord, now: Timestamp) -> Result<()> {
    if now < castle.economy.settle_time {
        return Err(CastleError::Validation(format!(
            "time moved backwards for castle {}: last settled at {}, now {now}",
            castle.id, castle.economy.settle_time
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::minutes;
    use crate::random::SequenceRandom;

    fn two_castles() -> (Engine, CastleId, CastleId) {
        let mut engine = Engine::with_seed(1);
        let a = engine
            .register_new("alice", "A", CastleSize::Small, Race::Human, 0)
            .unwrap();
        let b = engine
            .register_new("bob", "B", CastleSize::Small, Race::Orc, 0)
            .unwrap();
        (engine, a, b)
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let (engine, a, b) = two_castles();
        assert_eq!(a, CastleId(1));
        assert_eq!(b, CastleId(2));
        assert_eq!(engine.registry().population(CastleSize::Small), 2);
    }

    #[test]
    fn test_settle_unknown_castle() {
        let mut engine = Engine::default();
        assert_eq!(
            engine.settle(CastleId(9), 0),
            Err(CastleError::NotFound(CastleId(9)))
        );
    }

    #[test]
    fn test_settle_rejects_backwards_time() {
        let (mut engine, a, _) = two_castles();
        engine.settle(a, minutes(2)).unwrap();
        assert!(matches!(
            engine.settle(a, minutes(1)),
            Err(CastleError::Validation(_))
        ));
    }

    #[test]
    fn test_recruit_spends_treasury() {
        let (mut engine, a, _) = two_castles();
        // 10 minutes at 110/min = 1100
        engine.recruit(a, 5, minutes(10)).unwrap();

        let castle = engine.castle(a).unwrap();
        assert_eq!(castle.military.soldiers, 15);
        assert_eq!(castle.economy.treasury, 600);
        assert_eq!(castle.military.total_attack_power, 2000 + 1500);
        assert_eq!(castle.economy.soldier_buff.magnitude, 15);
    }

    #[test]
    fn test_recruit_insufficient_treasury_leaves_state() {
        let (mut engine, a, _) = two_castles();
        let before = engine.castle(a).unwrap().clone();

        assert_eq!(
            engine.recruit(a, 20, minutes(10)),
            Err(CastleError::InsufficientTreasury {
                required: 2000,
                available: 1100
            })
        );
        assert_eq!(engine.castle(a).unwrap(), &before);
    }

    #[test]
    fn test_recruit_over_cap_leaves_state() {
        let (mut engine, a, _) = two_castles();
        let before = engine.castle(a).unwrap().clone();

        assert_eq!(
            engine.recruit(a, 491, minutes(1_000)),
            Err(CastleError::SoldierCapExceeded {
                current: 10,
                requested: 491,
                limit: 500
            })
        );
        assert_eq!(engine.castle(a).unwrap(), &before);
    }

    #[test]
    fn test_battle_needs_two_castles() {
        let mut engine = Engine::default();
        let a = engine
            .register_new("alice", "A", CastleSize::Small, Race::Human, 0)
            .unwrap();
        assert_eq!(
            engine.battle(a, 0),
            Err(CastleError::InsufficientPopulation { available: 1 })
        );
    }

    #[test]
    fn test_battle_updates_both_castles() {
        let (mut engine, a, b) = two_castles();
        let mut rng = SequenceRandom::new(vec![1]);

        let outcome = engine.battle_with(a, minutes(5), &mut rng).unwrap();
        assert_eq!(outcome.attacker, a);
        assert_eq!(outcome.defender, b);

        let winner = engine.castle(outcome.winner).unwrap();
        let loser = engine.castle(outcome.loser).unwrap();
        assert_eq!(loser.military.soldiers, 0);
        assert_eq!(winner.military.battle_cooldown, minutes(5) + 30_000);
        assert_eq!(loser.military.battle_cooldown, minutes(5) + 120_000);
        assert!(!engine.registry().is_extracted(a));
        assert!(!engine.registry().is_extracted(b));
    }

    #[test]
    fn test_battle_on_cooldown_leaves_state() {
        let (mut engine, a, b) = two_castles();
        let mut rng = SequenceRandom::new(vec![1, 0]);
        engine.battle_with(a, minutes(5), &mut rng).unwrap();
        let hash = engine.state_hash();

        let err = engine.battle_with(b, minutes(5) + 1_000, &mut rng).unwrap_err();
        assert!(matches!(err, CastleError::OnCooldown { .. }));
        assert_eq!(engine.state_hash(), hash);
    }

    #[test]
    fn test_apply_dispatches_commands() {
        let mut engine = Engine::with_seed(3);
        let result = engine
            .apply(
                &EngineCommand::Register {
                    owner: "alice".to_string(),
                    name: "A".to_string(),
                    size: CastleSize::Big,
                    race: Race::Elf,
                },
                0,
            )
            .unwrap();
        assert_eq!(result, CommandResult::Registered(CastleId(1)));
        assert_eq!(
            engine.apply(&EngineCommand::Upgrade(CastleId(1)), 0),
            Ok(CommandResult::Upgraded(0))
        );
    }

    #[test]
    fn test_serialize_round_trip() {
        let (mut engine, a, _) = two_castles();
        engine.battle(a, minutes(3)).unwrap();

        let bytes = engine.serialize().unwrap();
        let restored = Engine::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), engine.state_hash());
        assert_eq!(restored.castle(a), engine.castle(a));
    }

    #[test]
    fn test_deserialize_garbage() {
        assert!(matches!(
            Engine::deserialize(&[1, 2, 3]),
            Err(CastleError::InvalidState(_))
        ));
    }
}
