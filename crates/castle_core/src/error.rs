//! Error types for the castle engine.

use thiserror::Error;

use crate::castle::{CastleId, CastleSize};

/// Result type alias using [`CastleError`].
pub type Result<T> = std::result::Result<T, CastleError>;

/// Top-level error type for all engine operations.
///
/// Every variant except [`CastleError::Validation`] and
/// [`CastleError::InvalidState`] is an expected condition the caller can
/// recover from. In all cases the engine state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastleError {
    /// Caller contract violation (bad enum id, time moving backwards, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The size class already holds its maximum number of castles.
    #[error("Castle capacity exceeded for {size:?}: limit is {limit}")]
    CapacityExceeded {
        /// Size class that is full.
        size: CastleSize,
        /// Population cap of that class.
        limit: u64,
    },

    /// Recruiting would push the garrison past the size-class cap.
    #[error("Soldier cap exceeded: have {current}, requested {requested}, limit {limit}")]
    SoldierCapExceeded {
        /// Soldiers currently stationed.
        current: u64,
        /// Soldiers requested.
        requested: u64,
        /// Maximum soldiers for the castle's size.
        limit: u64,
    },

    /// Treasury cannot cover the cost.
    #[error("Insufficient treasury: need {required}, have {available}")]
    InsufficientTreasury {
        /// Amount required.
        required: u64,
        /// Amount available after settlement.
        available: u64,
    },

    /// A participant is still recovering from its last battle.
    #[error("Castle {castle} is on battle cooldown until {until} (now {now})")]
    OnCooldown {
        /// Castle that cannot fight yet.
        castle: CastleId,
        /// Timestamp at which it may fight again.
        until: u64,
        /// Timestamp of the attempted battle.
        now: u64,
    },

    /// Fewer than two castles exist, so no opponent can be drawn.
    #[error("Insufficient population: {available} castle(s) registered, need at least 2")]
    InsufficientPopulation {
        /// Number of registered castles.
        available: usize,
    },

    /// The random source never produced an opponent within the draw budget.
    #[error("No opponent found for castle {castle} after {draws} draws")]
    TargetSelectionExhausted {
        /// Attacking castle.
        castle: CastleId,
        /// Draws attempted.
        draws: u32,
    },

    /// Castle is not registered, or is currently extracted by another operation.
    #[error("Castle not found: {0}")]
    NotFound(CastleId),

    /// Snapshot, replay or configuration data could not be processed.
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}
