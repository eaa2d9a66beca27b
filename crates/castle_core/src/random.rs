//! Randomness service used for opponent selection.
//!
//! The engine never touches system randomness. Callers plug in any
//! [`RandomSource`]; [`SeededRandom`] is the deterministic default so that
//! identical seeds and command streams produce identical games.

use serde::{Deserialize, Serialize};

/// Produces uniformly distributed integers.
pub trait RandomSource {
    /// Return an integer in `[0, range)`. `range` is never zero.
    fn next_index(&mut self, range: u64) -> u64;
}

/// Small deterministic generator (splitmix64).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl RandomSource for SeededRandom {
    fn next_index(&mut self, range: u64) -> u64 {
        if range == 0 {
            return 0;
        }
        // Widening multiply maps the full 64-bit output onto the range.
        let wide = u128::from(self.next_u64()) * u128::from(range);
        u64::try_from(wide >> 64).unwrap_or(range - 1)
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// Each value is reduced modulo the requested range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceRandom {
    values: Vec<u64>,
    cursor: usize,
}

impl SequenceRandom {
    /// Create a source that yields `values` in order.
    #[must_use]
    pub fn new(values: Vec<u64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn next_index(&mut self, range: u64) -> u64 {
        if self.values.is_empty() || range == 0 {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value % range
    }
}
