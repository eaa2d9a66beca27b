//! Battle resolution between two castles.
//!
//! A battle runs through these phases:
//!
//! 1. **Select target** - draw a random opponent (see [`crate::engine`])
//! 2. **Check cooldown** - both castles must be ready, then both are extracted
//! 3. **Compute power** - attacker's total attack vs defender's total defense,
//!    with a 1.5x race-advantage bonus to whichever side holds it
//! 4. **Arbitrate** - the attacker wins only with strictly greater power
//! 5. **Settle winner / loser** - economy settlement, attrition, experience,
//!    plunder buff and reparation debuff, cooldowns
//! 6. **Emit** - a [`BattleOutcome`] for the caller
//!
//! Functions here operate on records that have already been extracted from
//! the registry, so they cannot fail and cannot be observed half-done.

use serde::{Deserialize, Serialize};

use crate::buff::Buff;
use crate::castle::{CastleId, CastleRecord, Timestamp};
use crate::error::{CastleError, Result};
use crate::math::{ceil_div, saturate, scale_ceil};
use crate::progression::battle_experience;
use crate::rules::RulesConfig;

/// Race advantage multiplier numerator (1.5 = 15 / 10).
pub const ADVANTAGE_NUMERATOR: u64 = 15;

/// Race advantage multiplier denominator.
pub const ADVANTAGE_DENOMINATOR: u64 = 10;

/// Effective powers entering arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerComparison {
    /// Attacker's attack after any race bonus.
    pub attack: u64,
    /// Defender's defense after any race bonus.
    pub defense: u64,
    /// Whether the attacker's race beats the defender's.
    pub attacker_advantage: bool,
    /// Whether the defender's race beats the attacker's.
    pub defender_advantage: bool,
}

impl PowerComparison {
    /// Ties go to the defender.
    #[must_use]
    pub const fn attacker_wins(&self) -> bool {
        self.attack > self.defense
    }
}

/// Record of a resolved battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Castle that started the battle.
    pub attacker: CastleId,
    /// Castle that was drawn as opponent.
    pub defender: CastleId,
    /// Winning castle.
    pub winner: CastleId,
    /// Losing castle.
    pub loser: CastleId,
    /// Soldiers the winner lost.
    pub winner_soldiers_lost: u64,
    /// Soldiers the loser lost (its whole garrison).
    pub loser_soldiers_lost: u64,
    /// Magnitude of the plunder buff and reparation debuff.
    pub reparation_economic_power: u64,
    /// When the battle happened.
    pub battle_time: Timestamp,
    /// When the plunder buff and reparation debuff end.
    pub reparation_end_time: Timestamp,
}

/// Fail with [`CastleError::OnCooldown`] if the castle cannot fight at `now`.
pub fn ensure_ready(castle: &CastleRecord, now: Timestamp) -> Result<()> {
    if castle.can_battle(now) {
        Ok(())
    } else {
        Err(CastleError::OnCooldown {
            castle: castle.id,
            until: castle.military.battle_cooldown,
            now,
        })
    }
}

/// Compare attacker attack against defender defense.
#[must_use]
pub fn compare_power(attacker: &CastleRecord, defender: &CastleRecord) -> PowerComparison {
    let attacker_advantage = attacker.race.has_advantage_over(defender.race);
    let defender_advantage = defender.race.has_advantage_over(attacker.race);

    let mut attack = attacker.military.total_attack_power;
    let mut defense = defender.military.total_defense_power;
    if attacker_advantage {
        attack = scale_ceil(attack, ADVANTAGE_NUMERATOR, ADVANTAGE_DENOMINATOR);
    }
    if defender_advantage {
        defense = scale_ceil(defense, ADVANTAGE_NUMERATOR, ADVANTAGE_DENOMINATOR);
    }

    PowerComparison {
        attack,
        defense,
        attacker_advantage,
        defender_advantage,
    }
}

/// Surviving winner soldiers given both sides' soldier power.
///
/// `ceil((winner_defense_total - loser_attack_total) / per_soldier_defense)`
/// when the winner's soldiers out-defend the loser's soldiers, otherwise 0.
#[must_use]
pub fn soldiers_left(
    winner_defense_total: u64,
    loser_attack_total: u64,
    per_soldier_defense: u64,
) -> u64 {
    if winner_defense_total <= loser_attack_total {
        return 0;
    }
    saturate(ceil_div(
        u128::from(winner_defense_total - loser_attack_total),
        u128::from(per_soldier_defense),
    ))
}

/// Resolve a battle between two extracted castles at `now`.
///
/// Both records are fully updated (settled treasury, soldiers, cached power,
/// experience, buffs, cooldowns) when this returns.
pub fn resolve(
    attacker: &mut CastleRecord,
    defender: &mut CastleRecord,
    now: Timestamp,
    rules: &RulesConfig,
) -> BattleOutcome {
    let comparison = compare_power(attacker, defender);
    let attacker_id = attacker.id;
    let defender_id = defender.id;

    let (winner, loser) = if comparison.attacker_wins() {
        (attacker, defender)
    } else {
        (defender, attacker)
    };

    // Settle on the pre-battle state so old rates cover the time up to now.
    winner.economy.settle(now);
    loser.economy.settle(now);

    let winner_soldiers = winner.military.soldier_totals(winner.race);
    let loser_soldiers = loser.military.soldier_totals(loser.race);
    let survivors = soldiers_left(
        winner_soldiers.defense,
        loser_soldiers.attack,
        winner.race.soldier_power().defense,
    )
    .min(winner.military.soldiers);

    let winner_soldiers_lost = winner.military.soldiers - survivors;
    let loser_soldiers_lost = loser.military.soldiers;
    let reparation = loser.economy.base_power;
    let reparation_end_time = now.saturating_add(rules.battle_buff_duration_ms);

    winner.experience_pool += battle_experience(winner.level);

    winner
        .economy
        .add_battle_buff(Buff::new(false, reparation, now, reparation_end_time));
    loser
        .economy
        .add_battle_buff(Buff::new(true, reparation, now, reparation_end_time));

    winner.set_soldiers(survivors);
    loser.set_soldiers(0);

    winner.military.battle_cooldown = now.saturating_add(rules.winner_cooldown_ms);
    loser.military.battle_cooldown = now.saturating_add(rules.loser_cooldown_ms);

    BattleOutcome {
        attacker: attacker_id,
        defender: defender_id,
        winner: winner.id,
        loser: loser.id,
        winner_soldiers_lost,
        loser_soldiers_lost,
        reparation_economic_power: reparation,
        battle_time: now,
        reparation_end_time,
    }
}
