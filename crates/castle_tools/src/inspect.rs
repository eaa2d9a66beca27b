//! Snapshot and replay inspection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use castle_core::engine::Engine;
use castle_core::replay::Replay;

use crate::error::Result;
use crate::skirmish::{standings, CastleSummary};

/// Load an engine snapshot written by `skirmish --snapshot`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid snapshot.
pub fn load_snapshot(path: &Path) -> Result<Engine> {
    let bytes = std::fs::read(path)?;
    Ok(Engine::deserialize(&bytes)?)
}

/// Write an engine snapshot.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn save_snapshot(engine: &Engine, path: &Path) -> Result<()> {
    std::fs::write(path, engine.serialize()?)?;
    Ok(())
}

/// Everything worth printing about a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotReport {
    /// Engine state hash.
    pub state_hash: u64,
    /// Castles in id order.
    pub castles: Vec<CastleSummary>,
}

/// Summarize a snapshot file, optionally only one owner's castles.
///
/// # Errors
///
/// See [`load_snapshot`].
pub fn inspect_snapshot(path: &Path, owner: Option<&str>) -> Result<SnapshotReport> {
    let engine = load_snapshot(path)?;
    let mut castles = standings(&engine);
    if let Some(owner) = owner {
        castles.retain(|castle| castle.owner == owner);
    }
    Ok(SnapshotReport {
        state_hash: engine.state_hash(),
        castles,
    })
}

/// Outcome of re-running a replay file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayCheck {
    /// Seed recorded in the replay.
    pub seed: u64,
    /// Commands re-executed.
    pub commands: usize,
    /// Hash the replay was finalized with, if any.
    pub recorded_hash: Option<u64>,
    /// Hash after re-running.
    pub replayed_hash: u64,
}

/// Load a replay and re-run it, failing if it diverges from its recorded
/// final hash.
///
/// # Errors
///
/// Returns an error if the replay cannot be loaded or diverges.
pub fn verify_replay(path: &Path) -> Result<ReplayCheck> {
    let replay = Replay::load(path)?;
    let engine = replay.run()?;
    Ok(ReplayCheck {
        seed: replay.seed,
        commands: replay.commands.len(),
        recorded_hash: replay.final_hash,
        replayed_hash: engine.state_hash(),
    })
}
