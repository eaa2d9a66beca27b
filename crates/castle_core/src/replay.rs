//! Replay journal for recording and re-running games.
//!
//! A replay stores the seed, the rules and the timestamped stream of commands
//! issued during a game. Since the engine is deterministic, running the stream
//! into a fresh engine reproduces the final state exactly, including the
//! commands that failed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::castle::Timestamp;
use crate::engine::{CommandResult, Engine, EngineCommand};
use crate::error::{CastleError, Result};
use crate::rules::RulesConfig;

/// Replay file format version.
pub const REPLAY_VERSION: u32 = 1;

/// A single timestamped command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCommand {
    /// When the command was issued.
    pub at: Timestamp,
    /// The command.
    pub command: EngineCommand,
}

/// Complete replay data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Seed of the engine's random source.
    pub seed: u64,
    /// Rules the game ran under.
    pub rules: RulesConfig,
    /// Commands in issue order.
    pub commands: Vec<ReplayCommand>,
    /// State hash after the last command, once finalized.
    pub final_hash: Option<u64>,
}

impl Replay {
    /// Start an empty replay.
    #[must_use]
    pub fn new(seed: u64, rules: RulesConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            seed,
            rules,
            commands: Vec::new(),
            final_hash: None,
        }
    }

    /// Create the fresh engine this replay starts from.
    #[must_use]
    pub fn initial_engine(&self) -> Engine {
        Engine::new(self.rules.clone(), self.seed)
    }

    /// Apply a command to `engine` and record it.
    ///
    /// The command is recorded whether or not it succeeds.
    pub fn execute(
        &mut self,
        engine: &mut Engine,
        command: EngineCommand,
        at: Timestamp,
    ) -> Result<CommandResult> {
        let result = engine.apply(&command, at);
        self.commands.push(ReplayCommand { at, command });
        result
    }

    /// Record the final state hash.
    pub fn finalize(&mut self, engine: &Engine) {
        self.final_hash = Some(engine.state_hash());
    }

    /// Re-run every command into a fresh engine.
    ///
    /// # Errors
    ///
    /// [`CastleError::InvalidState`] if the result does not match the
    /// recorded final hash.
    pub fn run(&self) -> Result<Engine> {
        let mut engine = self.initial_engine();
        for record in &self.commands {
            if let Err(err) = engine.apply(&record.command, record.at) {
                tracing::debug!(at = record.at, %err, "Replayed command failed");
            }
        }

        if let Some(expected) = self.final_hash {
            let actual = engine.state_hash();
            if actual != expected {
                return Err(CastleError::InvalidState(format!(
                    "Replay diverged: expected hash {expected}, got {actual}"
                )));
            }
        }
        Ok(engine)
    }

    /// Commands issued at exactly `at`.
    #[must_use]
    pub fn commands_at(&self, at: Timestamp) -> Vec<&ReplayCommand> {
        self.commands.iter().filter(|cmd| cmd.at == at).collect()
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| CastleError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| CastleError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if reading, deserialization or the version check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| CastleError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes).map_err(|e| {
            CastleError::InvalidState(format!("Failed to deserialize replay: {e}"))
        })?;

        if replay.version != REPLAY_VERSION {
            return Err(CastleError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }
        Ok(replay)
    }
}
