//! Treasury accrual.
//!
//! A castle earns currency continuously from three sources, all materialized
//! on demand by [`Economy::settle`]:
//!
//! 1. its base economic power, over `[settle_time, now]`;
//! 2. the permanent soldier buff (upkeep income scaled by garrison size);
//! 3. transient battle buffs and debuffs issued by combat.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::buff::{Buff, MILLIS_PER_MINUTE};
use crate::castle::Timestamp;
use crate::error::{CastleError, Result};
use crate::math::saturate;

/// Currency per minute contributed by each stationed soldier.
pub const SOLDIER_ECONOMIC_POWER: u64 = 1;

/// Economic state of a castle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Economy {
    /// Settled currency.
    pub treasury: u64,
    /// Base currency per minute.
    pub base_power: u64,
    /// Time up to which base power has been accrued.
    pub settle_time: Timestamp,
    /// Permanent per-soldier income.
    pub soldier_buff: Buff,
    /// Transient buffs and debuffs from battles.
    pub battle_buffs: Vec<Buff>,
}

/// Summary of one settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settlement {
    /// Total added to the treasury before deductions.
    pub credited: u64,
    /// Total deducted by debuffs.
    pub debited: u64,
    /// Battle buffs dropped because their window ended.
    pub expired_buffs: usize,
    /// Whether deductions exceeded the available treasury and were clamped.
    pub saturated: bool,
}

impl Economy {
    /// Create the economy of a fresh castle.
    #[must_use]
    pub fn new(base_power: u64, soldiers: u64, now: Timestamp) -> Self {
        Self {
            treasury: 0,
            base_power,
            settle_time: now,
            soldier_buff: Buff::permanent(false, soldiers * SOLDIER_ECONOMIC_POWER, now),
            battle_buffs: Vec::new(),
        }
    }

    /// Materialize all pending accrual up to `now`.
    ///
    /// Credits and debits are netted before touching the treasury, so the
    /// result does not depend on buff order. A net deduction larger than the
    /// treasury empties it instead of underflowing.
    ///
    /// Calling this twice with the same `now` is a no-op the second time.
    pub fn settle(&mut self, now: Timestamp) -> Settlement {
        let mut settlement = Settlement::default();
        let mut credit: u128 = 0;
        let mut debit: u128 = 0;

        // 1. Base power
        let base = Buff::permanent(false, self.base_power, self.settle_time);
        let (accrual, _) = base.accrue(now);
        credit += u128::from(accrual.amount);
        self.settle_time = self.settle_time.max(now);

        // 2. Soldier upkeep
        let (accrual, soldier_buff) = self.soldier_buff.accrue(now);
        self.soldier_buff = soldier_buff;
        if accrual.is_debuff {
            debit += u128::from(accrual.amount);
        } else {
            credit += u128::from(accrual.amount);
        }

        // 3. Battle buffs
        let mut kept = Vec::with_capacity(self.battle_buffs.len());
        for buff in self.battle_buffs.drain(..) {
            let (accrual, advanced) = buff.accrue(now);
            if accrual.is_debuff {
                debit += u128::from(accrual.amount);
            } else {
                credit += u128::from(accrual.amount);
            }
            if accrual.expired {
                settlement.expired_buffs += 1;
            } else {
                kept.push(advanced);
            }
        }
        self.battle_buffs = kept;

        let available = u128::from(self.treasury) + credit;
        settlement.saturated = debit > available;
        self.treasury = saturate(available.saturating_sub(debit));
        settlement.credited = saturate(credit);
        settlement.debited = saturate(debit);

        if settlement.saturated {
            tracing::warn!(
                debited = settlement.debited,
                credited = settlement.credited,
                "Debuff exceeded treasury, clamped to zero"
            );
        }

        settlement
    }

    /// Rescale the soldier buff to a new garrison size.
    ///
    /// Must follow a settlement at the current time.
    pub fn set_soldier_count(&mut self, soldiers: u64) {
        self.soldier_buff.magnitude = soldiers * SOLDIER_ECONOMIC_POWER;
    }

    /// Attach a battle buff or debuff.
    pub fn add_battle_buff(&mut self, buff: Buff) {
        self.battle_buffs.push(buff);
    }

    /// Check if the treasury covers `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: u64) -> bool {
        self.treasury >= cost
    }

    /// Spend from the treasury.
    pub fn spend(&mut self, cost: u64) -> Result<()> {
        if !self.can_afford(cost) {
            return Err(CastleError::InsufficientTreasury {
                required: cost,
                available: self.treasury,
            });
        }
        self.treasury -= cost;
        Ok(())
    }

    /// Net currency per minute at `now`, counting only buffs still active.
    #[must_use]
    pub fn income_per_minute(&self, now: Timestamp) -> i128 {
        let signed = |buff: &Buff| {
            let magnitude = i128::from(buff.magnitude);
            if buff.is_debuff {
                -magnitude
            } else {
                magnitude
            }
        };
        let battle: i128 = self
            .battle_buffs
            .iter()
            .filter(|buff| !buff.is_expired_at(now))
            .map(signed)
            .sum();
        i128::from(self.base_power) + signed(&self.soldier_buff) + battle
    }

    /// Treasury that a settlement at `now` would produce, without mutating.
    #[must_use]
    pub fn projected_treasury(&self, now: Timestamp) -> u64 {
        let mut preview = self.clone();
        preview.settle(now);
        preview.treasury
    }
}

/// Convert a minute count to milliseconds.
#[must_use]
pub const fn minutes(n: u64) -> Timestamp {
    n * MILLIS_PER_MINUTE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy() -> Economy {
        // 100 base + 10 soldiers
        Economy::new(100, 10, 0)
    }

    #[test]
    fn test_settle_base_and_soldiers() {
        let mut economy = economy();
        let settlement = economy.settle(minutes(1));

        assert_eq!(settlement.credited, 110);
        assert_eq!(economy.treasury, 110);
        assert_eq!(economy.settle_time, minutes(1));
        assert_eq!(economy.soldier_buff.window_start, minutes(1));
    }

    #[test]
    fn test_settle_idempotent() {
        let mut economy = economy();
        economy.settle(minutes(3));
        let before = economy.treasury;

        let settlement = economy.settle(minutes(3));
        assert_eq!(settlement.credited, 0);
        assert_eq!(economy.treasury, before);
    }

    #[test]
    fn test_battle_buff_expires_after_final_accrual() {
        let mut economy = economy();
        economy.add_battle_buff(Buff::new(false, 60, 0, minutes(2)));

        let settlement = economy.settle(minutes(5));
        // 5 * 110 base+soldiers, plus 2 * 60 from the buff
        assert_eq!(economy.treasury, 550 + 120);
        assert_eq!(settlement.expired_buffs, 1);
        assert!(economy.battle_buffs.is_empty());
    }

    #[test]
    fn test_battle_buff_advances_when_active() {
        let mut economy = economy();
        economy.add_battle_buff(Buff::new(false, 60, 0, minutes(10)));

        economy.settle(minutes(1));
        assert_eq!(economy.battle_buffs.len(), 1);
        assert_eq!(economy.battle_buffs[0].window_start, minutes(1));
        assert_eq!(economy.treasury, 170);
    }

    #[test]
    fn test_debuff_saturates_at_zero() {
        let mut economy = Economy::new(0, 0, 0);
        economy.add_battle_buff(Buff::new(true, 500, 0, minutes(1)));

        let settlement = economy.settle(minutes(1));
        assert!(settlement.saturated);
        assert_eq!(economy.treasury, 0);
    }

    #[test]
    fn test_debuff_netted_against_income() {
        let mut economy = economy();
        economy.add_battle_buff(Buff::new(true, 50, 0, minutes(10)));

        let settlement = economy.settle(minutes(1));
        assert!(!settlement.saturated);
        assert_eq!(economy.treasury, 60);
    }

    #[test]
    fn test_spend() {
        let mut economy = economy();
        economy.treasury = 300;

        assert!(economy.spend(200).is_ok());
        assert_eq!(economy.treasury, 100);
        assert_eq!(
            economy.spend(200),
            Err(CastleError::InsufficientTreasury {
                required: 200,
                available: 100
            })
        );
        assert_eq!(economy.treasury, 100);
    }

    #[test]
    fn test_income_per_minute() {
        let mut economy = economy();
        economy.add_battle_buff(Buff::new(true, 30, 0, minutes(5)));
        assert_eq!(economy.income_per_minute(0), 80);
        assert_eq!(economy.income_per_minute(minutes(5)), 110);
    }

    #[test]
    fn test_projected_treasury_does_not_mutate() {
        let economy = economy();
        assert_eq!(economy.projected_treasury(minutes(2)), 220);
        assert_eq!(economy.treasury, 0);
    }
}
