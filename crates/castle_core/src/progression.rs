//! Experience and leveling.

use crate::castle::{CastleRecord, MAX_LEVEL};
use crate::math::compound_growth;
use crate::military::base_power_at;

/// Experience needed to advance from level `i + 1` to `i + 2`.
pub static REQUIRED_EXPERIENCE: [u64; 9] = [100, 150, 225, 338, 507, 760, 1140, 1709, 2563];

/// Experience a winner at level `i + 1` gains per battle.
pub static BATTLE_EXPERIENCE: [u64; 10] = [25, 30, 40, 55, 75, 100, 130, 165, 205, 250];

/// Experience required to leave `level`, or `None` at the top level.
#[must_use]
pub fn required_experience(level: u8) -> Option<u64> {
    if level == 0 {
        return None;
    }
    REQUIRED_EXPERIENCE.get(usize::from(level) - 1).copied()
}

/// Experience granted to a battle winner at `level`.
#[must_use]
pub fn battle_experience(level: u8) -> u64 {
    let index = usize::from(level.clamp(1, MAX_LEVEL)) - 1;
    BATTLE_EXPERIENCE[index]
}

/// Base economic power of a castle at its current level.
#[must_use]
pub fn economic_power_at(castle: &CastleRecord) -> u64 {
    compound_growth(castle.size.initial_economic_power(), castle.level)
}

/// Spend pooled experience on as many levels as it covers.
///
/// Returns the number of levels gained. When at least one level is gained,
/// base economic power and base military power are recomputed and the cached
/// military totals refreshed.
pub fn upgrade(castle: &mut CastleRecord) -> u8 {
    let mut gained = 0;
    while castle.level < MAX_LEVEL {
        let Some(required) = required_experience(castle.level) else {
            break;
        };
        if castle.experience_pool < required {
            break;
        }
        castle.experience_pool -= required;
        castle.level += 1;
        gained += 1;
    }

    if gained > 0 {
        castle.economy.base_power = economic_power_at(castle);
        let base = base_power_at(castle.race, castle.size, castle.level);
        castle.military.set_base_power(base, castle.race);
        tracing::debug!(
            castle = castle.id.0,
            level = castle.level,
            gained,
            "Castle upgraded"
        );
    }

    gained
}
