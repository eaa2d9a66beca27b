//! Time-windowed economic modifiers.
//!
//! A [`Buff`] adds (or, as a debuff, removes) currency at a fixed rate per
//! minute over a validity window. Accrual is pull-based: the owner calls
//! [`Buff::accrue`] with the current time, applies the returned amount, and
//! stores the advanced buff. Since the window start moves to `now` after every
//! accrual, no interval is ever counted twice.

use serde::{Deserialize, Serialize};

use crate::castle::Timestamp;
use crate::math::{ceil_div, saturate};

/// Milliseconds per accrual minute.
pub const MILLIS_PER_MINUTE: u64 = 60_000;

/// Window end marker for buffs that never expire.
pub const UNBOUNDED: Timestamp = 0;

/// A time-windowed economic modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Buff {
    /// Whether accrued amounts are subtracted instead of added.
    pub is_debuff: bool,
    /// Currency per minute.
    pub magnitude: u64,
    /// Start of the not-yet-accrued part of the window.
    pub window_start: Timestamp,
    /// End of validity, or [`UNBOUNDED`].
    pub window_end: Timestamp,
}

/// Result of accruing a buff up to some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Whole currency units produced (always rounded up).
    pub amount: u64,
    /// Whether the amount is a deduction.
    pub is_debuff: bool,
    /// Whether the buff has reached its end and must be dropped after this accrual.
    pub expired: bool,
}

impl Accrual {
    /// Signed view of the amount.
    #[must_use]
    pub fn signed(&self) -> i128 {
        let amount = i128::from(self.amount);
        if self.is_debuff {
            -amount
        } else {
            amount
        }
    }
}

impl Buff {
    /// Create a bounded buff over `[start, end]`.
    #[must_use]
    pub const fn new(is_debuff: bool, magnitude: u64, start: Timestamp, end: Timestamp) -> Self {
        Self {
            is_debuff,
            magnitude,
            window_start: start,
            window_end: end,
        }
    }

    /// Create a buff that never expires.
    #[must_use]
    pub const fn permanent(is_debuff: bool, magnitude: u64, start: Timestamp) -> Self {
        Self::new(is_debuff, magnitude, start, UNBOUNDED)
    }

    /// Whether this buff has no end.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.window_end == UNBOUNDED
    }

    /// Whether the buff's validity has fully elapsed at `now`.
    #[must_use]
    pub const fn is_expired_at(&self, now: Timestamp) -> bool {
        !self.is_unbounded() && self.window_end <= now
    }

    /// Accrue everything owed up to `now`.
    ///
    /// Returns the accrual and the buff advanced to `now`. The elapsed time is
    /// clipped to the window end, and the amount is
    /// `ceil(magnitude * elapsed / 60000)`.
    #[must_use]
    pub fn accrue(self, now: Timestamp) -> (Accrual, Self) {
        let until = if self.is_unbounded() {
            now
        } else {
            now.min(self.window_end)
        };
        let elapsed = until.saturating_sub(self.window_start);
        let amount = saturate(ceil_div(
            u128::from(self.magnitude) * u128::from(elapsed),
            u128::from(MILLIS_PER_MINUTE),
        ));

        let accrual = Accrual {
            amount,
            is_debuff: self.is_debuff,
            expired: self.is_expired_at(now),
        };
        let advanced = Self {
            window_start: self.window_start.max(now),
            ..self
        };
        (accrual, advanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_minute() {
        let buff = Buff::permanent(false, 100, 0);
        let (accrual, next) = buff.accrue(MILLIS_PER_MINUTE);

        assert_eq!(accrual.amount, 100);
        assert!(!accrual.expired);
        assert_eq!(next.window_start, MILLIS_PER_MINUTE);
    }

    #[test]
    fn test_partial_minute_rounds_up() {
        let buff = Buff::permanent(false, 100, 0);
        // 100 * 1ms / 60000 = 0.0016 -> 1
        let (accrual, _) = buff.accrue(1);
        assert_eq!(accrual.amount, 1);

        // 100 * 30s = 50 exactly
        let (accrual, _) = buff.accrue(30_000);
        assert_eq!(accrual.amount, 50);
    }

    #[test]
    fn test_second_accrual_at_same_time_is_zero() {
        let buff = Buff::permanent(false, 250, 1_000);
        let (_, next) = buff.accrue(90_000);
        let (again, _) = next.accrue(90_000);
        assert_eq!(again.amount, 0);
    }

    #[test]
    fn test_bounded_buff_clips_to_end() {
        let buff = Buff::new(false, 60, 0, 2 * MILLIS_PER_MINUTE);
        let (accrual, _) = buff.accrue(10 * MILLIS_PER_MINUTE);

        assert_eq!(accrual.amount, 120);
        assert!(accrual.expired);
    }

    #[test]
    fn test_expired_buff_accrues_nothing_more() {
        let buff = Buff::new(true, 60, 0, MILLIS_PER_MINUTE);
        let (_, next) = buff.accrue(5 * MILLIS_PER_MINUTE);
        let (accrual, _) = next.accrue(6 * MILLIS_PER_MINUTE);

        assert_eq!(accrual.amount, 0);
        assert!(accrual.expired);
    }

    #[test]
    fn test_expiry_at_exact_end() {
        let buff = Buff::new(false, 60, 0, MILLIS_PER_MINUTE);
        let (accrual, _) = buff.accrue(MILLIS_PER_MINUTE);
        assert_eq!(accrual.amount, 60);
        assert!(accrual.expired);
    }

    #[test]
    fn test_debuff_signed() {
        let buff = Buff::permanent(true, 60, 0);
        let (accrual, _) = buff.accrue(MILLIS_PER_MINUTE);
        assert_eq!(accrual.signed(), -60);
    }
}
