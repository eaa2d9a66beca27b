//! # Castle Core
//!
//! Deterministic economy and battle engine for the castle strategy game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No network transport
//! - No system randomness (opponents are drawn from a pluggable, seedable source)
//! - No floating-point math (all rounding is explicit integer ceiling division)
//!
//! This separation enables:
//! - Replays that reproduce a game bit for bit
//! - Headless balance runs
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`buff`] - Time-windowed economic modifiers
//! - [`economy`] - Treasury accrual and settlement
//! - [`military`] - Attack and defense power
//! - [`registry`] - Castle storage with population caps
//! - [`combat`] - Battle arbitration and settlement
//! - [`progression`] - Experience and leveling
//! - [`engine`] - The operation facade
//! - [`replay`] - Command journals

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod buff;
pub mod castle;
pub mod combat;
pub mod economy;
pub mod engine;
pub mod error;
pub mod math;
pub mod military;
pub mod progression;
pub mod random;
pub mod registry;
pub mod replay;
pub mod rules;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buff::{Accrual, Buff, MILLIS_PER_MINUTE};
    pub use crate::castle::{CastleId, CastleRecord, CastleSize, Race, Timestamp};
    pub use crate::combat::{BattleOutcome, PowerComparison};
    pub use crate::economy::{minutes, Economy, Settlement};
    pub use crate::engine::{CommandResult, Engine, EngineCommand};
    pub use crate::error::{CastleError, Result};
    pub use crate::military::{Military, PowerPair};
    pub use crate::random::{RandomSource, SeededRandom, SequenceRandom};
    pub use crate::registry::CastleRegistry;
    pub use crate::replay::Replay;
    pub use crate::rules::RulesConfig;
}
