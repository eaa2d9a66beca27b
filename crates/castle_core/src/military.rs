//! Garrison and combat power.
//!
//! Base power depends on race, size and level; each soldier adds a fixed
//! race-specific amount on top. Totals are cached on the record and
//! recomputed whenever soldiers or base power change, since combat reads
//! them directly.

use serde::{Deserialize, Serialize};

use crate::castle::{CastleSize, Race, Timestamp, INITIAL_LEVEL};
use crate::math::compound_growth;

/// Attack and defense pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowerPair {
    /// Attack power.
    pub attack: u64,
    /// Defense power.
    pub defense: u64,
}

impl PowerPair {
    /// Create a new power pair.
    #[must_use]
    pub const fn new(attack: u64, defense: u64) -> Self {
        Self { attack, defense }
    }
}

impl Race {
    /// Level-1 base power before the size factor is applied.
    #[must_use]
    pub const fn initial_power(self) -> PowerPair {
        match self {
            Self::Human => PowerPair::new(1000, 1000),
            Self::Elf => PowerPair::new(500, 1500),
            Self::Orc => PowerPair::new(1500, 500),
            Self::Goblin => PowerPair::new(1200, 800),
            Self::Undead => PowerPair::new(800, 1200),
        }
    }

    /// Power contributed by each soldier.
    #[must_use]
    pub const fn soldier_power(self) -> PowerPair {
        match self {
            Self::Human => PowerPair::new(100, 100),
            Self::Elf => PowerPair::new(50, 150),
            Self::Orc => PowerPair::new(150, 50),
            Self::Goblin => PowerPair::new(120, 80),
            Self::Undead => PowerPair::new(80, 120),
        }
    }
}

/// Base military power at `level`: `ceil(initial * size_factor * 1.2^(level-1))`.
#[must_use]
pub fn base_power_at(race: Race, size: CastleSize, level: u8) -> PowerPair {
    let initial = race.initial_power();
    PowerPair::new(
        compound_growth(initial.attack * size.factor(), level),
        compound_growth(initial.defense * size.factor(), level),
    )
}

/// Military state of a castle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Military {
    /// Base attack power.
    pub attack_power: u64,
    /// Base defense power.
    pub defense_power: u64,
    /// Cached base + soldier attack.
    pub total_attack_power: u64,
    /// Cached base + soldier defense.
    pub total_defense_power: u64,
    /// Stationed soldiers.
    pub soldiers: u64,
    /// Time before which the castle may not fight.
    pub battle_cooldown: Timestamp,
}

impl Military {
    /// Create the military of a fresh level-1 castle.
    #[must_use]
    pub fn new(race: Race, size: CastleSize, soldiers: u64, now: Timestamp) -> Self {
        let base = base_power_at(race, size, INITIAL_LEVEL);
        let mut military = Self {
            attack_power: base.attack,
            defense_power: base.defense,
            total_attack_power: 0,
            total_defense_power: 0,
            soldiers,
            battle_cooldown: now,
        };
        military.recompute_totals(race);
        military
    }

    /// Soldier contribution to attack and defense.
    #[must_use]
    pub fn soldier_totals(&self, race: Race) -> PowerPair {
        let per = race.soldier_power();
        PowerPair::new(self.soldiers * per.attack, self.soldiers * per.defense)
    }

    /// Refresh the cached totals from base power and soldier count.
    pub fn recompute_totals(&mut self, race: Race) {
        let soldiers = self.soldier_totals(race);
        self.total_attack_power = self.attack_power + soldiers.attack;
        self.total_defense_power = self.defense_power + soldiers.defense;
    }

    /// Replace base power and refresh totals.
    pub fn set_base_power(&mut self, base: PowerPair, race: Race) {
        self.attack_power = base.attack;
        self.defense_power = base.defense;
        self.recompute_totals(race);
    }
}
