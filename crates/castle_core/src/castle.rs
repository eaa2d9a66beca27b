//! Castle identifiers, size classes, races and the castle record itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::economy::Economy;
use crate::error::{CastleError, Result};
use crate::military::Military;

/// Millisecond timestamp supplied by the caller.
pub type Timestamp = u64;

/// Level every castle starts at.
pub const INITIAL_LEVEL: u8 = 1;

/// Highest reachable level.
pub const MAX_LEVEL: u8 = 10;

/// Garrison size of a freshly built castle.
pub const INITIAL_SOLDIERS: u64 = 10;

/// Unique identifier for castles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CastleId(pub u64);

impl fmt::Display for CastleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Castle size class.
///
/// Each class has a fixed power factor, population cap and garrison cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastleSize {
    /// Cheap and plentiful.
    Small,
    /// Balanced.
    Middle,
    /// Rare, with the largest garrison.
    Big,
}

impl CastleSize {
    /// All size classes in index order.
    pub const ALL: [Self; 3] = [Self::Small, Self::Middle, Self::Big];

    /// Decode a raw size id (1-based, as exposed to players).
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Self::Small),
            2 => Ok(Self::Middle),
            3 => Ok(Self::Big),
            other => Err(CastleError::Validation(format!("unknown castle size {other}"))),
        }
    }

    /// Raw 1-based id.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Small => 1,
            Self::Middle => 2,
            Self::Big => 3,
        }
    }

    /// Zero-based index into per-size tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.id() as usize - 1
    }

    /// Military power multiplier.
    #[must_use]
    pub const fn factor(self) -> u64 {
        match self {
            Self::Small => 2,
            Self::Middle => 3,
            Self::Big => 5,
        }
    }

    /// Maximum number of live castles of this size.
    #[must_use]
    pub const fn population_cap(self) -> u64 {
        match self {
            Self::Small => 500,
            Self::Middle => 300,
            Self::Big => 200,
        }
    }

    /// Maximum garrison size.
    #[must_use]
    pub const fn max_soldiers(self) -> u64 {
        match self {
            Self::Small => 500,
            Self::Middle => 1000,
            Self::Big => 2000,
        }
    }

    /// Level-1 economic power (currency per minute).
    ///
    /// The size factor is already folded into this constant.
    #[must_use]
    pub const fn initial_economic_power(self) -> u64 {
        match self {
            Self::Small => 100,
            Self::Middle => 150,
            Self::Big => 250,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Middle => "Middle",
            Self::Big => "Big",
        }
    }
}

/// Castle race.
///
/// Races form a cycle: each race has the advantage over the next one,
/// and `Undead` wraps around to beat `Human`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    /// Balanced attack and defense.
    Human,
    /// Defensive.
    Elf,
    /// Offensive.
    Orc,
    /// Leaning offensive.
    Goblin,
    /// Leaning defensive.
    Undead,
}

impl Race {
    /// All races in cycle order.
    pub const ALL: [Self; 5] = [Self::Human, Self::Elf, Self::Orc, Self::Goblin, Self::Undead];

    /// Decode a raw race id.
    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or_else(|| CastleError::Validation(format!("unknown race {id}")))
    }

    /// Raw race id (position in the advantage cycle).
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Human => 0,
            Self::Elf => 1,
            Self::Orc => 2,
            Self::Goblin => 3,
            Self::Undead => 4,
        }
    }

    /// Whether this race has the combat advantage over `other`.
    #[must_use]
    pub const fn has_advantage_over(self, other: Self) -> bool {
        (other.id() + 5 - self.id()) % 5 == 1
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Elf => "Elf",
            Self::Orc => "Orc",
            Self::Goblin => "Goblin",
            Self::Undead => "Undead",
        }
    }
}

/// A player-owned castle tracked by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastleRecord {
    /// Registry identifier.
    pub id: CastleId,
    /// Opaque owner handle supplied by the caller.
    pub owner: String,
    /// Display name.
    pub name: String,
    /// Size class.
    pub size: CastleSize,
    /// Race.
    pub race: Race,
    /// Current level (1..=10).
    pub level: u8,
    /// Unspent experience.
    pub experience_pool: u64,
    /// Treasury and accrual state.
    pub economy: Economy,
    /// Garrison and combat power.
    pub military: Military,
}

impl CastleRecord {
    /// Build a level-1 castle at `now`.
    #[must_use]
    pub fn new(
        id: CastleId,
        owner: impl Into<String>,
        name: impl Into<String>,
        size: CastleSize,
        race: Race,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            name: name.into(),
            size,
            race,
            level: INITIAL_LEVEL,
            experience_pool: 0,
            economy: Economy::new(size.initial_economic_power(), INITIAL_SOLDIERS, now),
            military: Military::new(race, size, INITIAL_SOLDIERS, now),
        }
    }

    /// Serial number: size code, race code, then the zero-padded id.
    #[must_use]
    pub fn serial_number(&self) -> String {
        format!("{}{}{:08}", self.size.id(), self.race.id(), self.id.0)
    }

    /// Change the garrison size, keeping cached totals and upkeep in step.
    ///
    /// The economy must already be settled at the current time so the soldier
    /// buff's new magnitude applies only from now on.
    pub fn set_soldiers(&mut self, soldiers: u64) {
        self.military.soldiers = soldiers;
        self.military.recompute_totals(self.race);
        self.economy.set_soldier_count(soldiers);
    }

    /// Whether the castle may fight at `now`.
    #[must_use]
    pub const fn can_battle(&self, now: Timestamp) -> bool {
        now >= self.military.battle_cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_advantage_is_cyclic() {
        assert!(Race::Human.has_advantage_over(Race::Elf));
        assert!(!Race::Elf.has_advantage_over(Race::Human));
        assert!(Race::Undead.has_advantage_over(Race::Human));
        assert!(!Race::Human.has_advantage_over(Race::Undead));
        assert!(!Race::Orc.has_advantage_over(Race::Orc));
    }

    #[test]
    fn test_advantage_never_mutual() {
        for a in Race::ALL {
            for b in Race::ALL {
                assert!(!(a.has_advantage_over(b) && b.has_advantage_over(a)));
            }
        }
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        assert!(matches!(Race::from_id(5), Err(CastleError::Validation(_))));
        assert!(matches!(CastleSize::from_id(0), Err(CastleError::Validation(_))));
        assert_eq!(Race::from_id(3).unwrap(), Race::Goblin);
        assert_eq!(CastleSize::from_id(3).unwrap(), CastleSize::Big);
    }

    #[test]
    fn test_new_castle_defaults() {
        let castle = CastleRecord::new(CastleId(7), "alice", "Keep", CastleSize::Small, Race::Human, 1_000);

        assert_eq!(castle.level, 1);
        assert_eq!(castle.experience_pool, 0);
        assert_eq!(castle.economy.treasury, 0);
        assert_eq!(castle.economy.settle_time, 1_000);
        assert_eq!(castle.military.soldiers, INITIAL_SOLDIERS);
        assert_eq!(castle.military.attack_power, 2_000);
        assert_eq!(castle.military.total_attack_power, 2_000 + 10 * 100);
        assert!(castle.can_battle(1_000));
    }

    #[test]
    fn test_serial_number_padding() {
        let castle = CastleRecord::new(CastleId(42), "bob", "Fort", CastleSize::Big, Race::Undead, 0);
        assert_eq!(castle.serial_number(), "3400000042");
    }
}
