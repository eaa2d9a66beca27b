//! Test fixtures and helpers.
//!
//! Pre-built engines and castle rosters for consistent testing. Rosters can
//! be written inline in Rust or loaded from RON text.

use serde::{Deserialize, Serialize};

use castle_core::castle::{CastleId, CastleRecord, CastleSize, Race, Timestamp};
use castle_core::engine::Engine;
use castle_core::rules::RulesConfig;

/// One castle to build in a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastleSetup {
    /// Owner handle.
    pub owner: String,
    /// Castle name.
    pub name: String,
    /// Size class.
    pub size: CastleSize,
    /// Race.
    pub race: Race,
}

impl CastleSetup {
    /// Setup with the owner doubling as the castle name.
    #[must_use]
    pub fn new(owner: &str, size: CastleSize, race: Race) -> Self {
        Self {
            owner: owner.to_string(),
            name: owner.to_string(),
            size,
            race,
        }
    }
}

/// Parse a roster from RON text, e.g.
/// `[(owner: "a", name: "A", size: Small, race: Elf)]`.
///
/// # Panics
///
/// Panics if the text is not a valid roster.
#[must_use]
pub fn roster_from_ron(text: &str) -> Vec<CastleSetup> {
    ron::from_str(text).unwrap_or_else(|e| panic!("invalid roster: {e}"))
}

/// Build an engine with default rules and register `roster` at `now`.
///
/// # Panics
///
/// Panics if any registration fails.
#[must_use]
pub fn engine_with(seed: u64, roster: &[CastleSetup], now: Timestamp) -> (Engine, Vec<CastleId>) {
    engine_with_rules(RulesConfig::default(), seed, roster, now)
}

/// Build an engine with custom rules and register `roster` at `now`.
///
/// # Panics
///
/// Panics if any registration fails.
#[must_use]
pub fn engine_with_rules(
    rules: RulesConfig,
    seed: u64,
    roster: &[CastleSetup],
    now: Timestamp,
) -> (Engine, Vec<CastleId>) {
    let mut engine = Engine::new(rules, seed);
    let ids = roster
        .iter()
        .map(|setup| {
            engine
                .register_new(setup.owner.clone(), setup.name.clone(), setup.size, setup.race, now)
                .unwrap_or_else(|e| panic!("fixture registration failed: {e}"))
        })
        .collect();
    (engine, ids)
}

/// Two small castles of the given races, registered at time zero.
#[must_use]
pub fn duel(seed: u64, first: Race, second: Race) -> (Engine, CastleId, CastleId) {
    let roster = [
        CastleSetup::new("first", CastleSize::Small, first),
        CastleSetup::new("second", CastleSize::Small, second),
    ];
    let (engine, ids) = engine_with(seed, &roster, 0);
    (engine, ids[0], ids[1])
}

/// One castle of every race and size, registered at time zero.
#[must_use]
pub fn full_roster() -> Vec<CastleSetup> {
    let mut roster = Vec::new();
    for size in CastleSize::ALL {
        for race in Race::ALL {
            let owner = format!("{}-{}", size.display_name(), race.display_name());
            roster.push(CastleSetup::new(&owner, size, race));
        }
    }
    roster
}

/// A standalone level-1 castle, outside any registry.
#[must_use]
pub fn castle(id: u64, size: CastleSize, race: Race) -> CastleRecord {
    CastleRecord::new(CastleId(id), "fixture", format!("castle-{id}"), size, race, 0)
}

/// A standalone castle with a custom garrison.
#[must_use]
pub fn castle_with_soldiers(id: u64, size: CastleSize, race: Race, soldiers: u64) -> CastleRecord {
    let mut record = castle(id, size, race);
    record.set_soldiers(soldiers);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_from_ron() {
        let roster = roster_from_ron(
            r#"[
                (owner: "alice", name: "Highkeep", size: Big, race: Elf),
                (owner: "bob", name: "Mudhold", size: Small, race: Goblin),
            ]"#,
        );
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Highkeep");
        assert_eq!(roster[1].race, Race::Goblin);
    }

    #[test]
    fn test_full_roster_registers_everything() {
        let roster = full_roster();
        let (engine, ids) = engine_with(0, &roster, 0);
        assert_eq!(ids.len(), 15);
        for size in CastleSize::ALL {
            assert_eq!(engine.registry().population(size), 5);
        }
    }

    #[test]
    fn test_castle_with_soldiers_updates_totals() {
        let record = castle_with_soldiers(1, CastleSize::Middle, Race::Orc, 3);
        assert_eq!(record.military.soldiers, 3);
        assert_eq!(record.military.total_attack_power, 4500 + 450);
        assert_eq!(record.economy.soldier_buff.magnitude, 3);
    }
}
