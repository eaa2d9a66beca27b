//! Integer math helpers for deterministic accrual and growth.
//!
//! Everything rounds up: a depositor never receives less than the linear
//! formula implies, and power never grows by less than the nominal rate.
//! Intermediates are widened to `u128` and saturate back into `u64`.

/// Numerator of the per-level growth rate (1.2 = 12 / 10).
pub const GROWTH_NUMERATOR: u128 = 12;

/// Denominator of the per-level growth rate.
pub const GROWTH_DENOMINATOR: u128 = 10;

/// Ceiling division of `numerator / denominator`.
///
/// A zero denominator yields zero.
#[must_use]
pub const fn ceil_div(numerator: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        return 0;
    }
    numerator.div_ceil(denominator)
}

/// Compute `ceil(value * num / den)` without overflow.
#[must_use]
pub fn scale_ceil(value: u64, num: u64, den: u64) -> u64 {
    saturate(ceil_div(u128::from(value) * u128::from(num), u128::from(den)))
}

/// Compound 20% growth: `ceil(initial * 1.2^(level - 1))`.
///
/// Level 0 is treated as level 1.
#[must_use]
pub fn compound_growth(initial: u64, level: u8) -> u64 {
    let steps = u32::from(level.saturating_sub(1));
    let num = GROWTH_NUMERATOR.pow(steps);
    let den = GROWTH_DENOMINATOR.pow(steps);
    saturate(ceil_div(u128::from(initial) * num, den))
}

/// Clamp a wide intermediate back into `u64`.
#[must_use]
pub fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(10, 5), 2);
        assert_eq!(ceil_div(11, 5), 3);
        assert_eq!(ceil_div(0, 5), 0);
        assert_eq!(ceil_div(7, 0), 0);
    }

    #[test]
    fn test_scale_ceil_race_bonus() {
        // 1.5x bonus expressed as 15 / 10
        assert_eq!(scale_ceil(1800, 15, 10), 2700);
        assert_eq!(scale_ceil(1001, 15, 10), 1502);
    }

    #[test]
    fn test_compound_growth() {
        assert_eq!(compound_growth(100, 1), 100);
        assert_eq!(compound_growth(100, 2), 120);
        assert_eq!(compound_growth(100, 3), 144);
        // 100 * 1.2^3 = 172.8 -> 173
        assert_eq!(compound_growth(100, 4), 173);
        // 7500 * 1.2^9 = 38698.35264 -> 38699
        assert_eq!(compound_growth(7_500, 10), 38_699);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(u128::from(u64::MAX) + 1), u64::MAX);
        assert_eq!(saturate(5), 5);
    }
}
