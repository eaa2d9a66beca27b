//! Tunable game rules.
//!
//! Rules are plain data designed to be deserialized from RON. Any field left
//! out of a rules file falls back to its default.
//!
//! # Example RON
//!
//! ```ron
//! RulesConfig(
//!     winner_cooldown_ms: 30000,
//!     loser_cooldown_ms: 120000,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CastleError, Result};

/// Timings and prices used by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Cooldown applied to the winner of a battle.
    pub winner_cooldown_ms: u64,
    /// Cooldown applied to the loser of a battle.
    pub loser_cooldown_ms: u64,
    /// Length of the plunder buff and reparation debuff windows.
    pub battle_buff_duration_ms: u64,
    /// Treasury cost of one soldier.
    pub soldier_price: u64,
    /// Opponent draws attempted before giving up.
    pub max_target_draws: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            winner_cooldown_ms: 30_000,
            loser_cooldown_ms: 120_000,
            battle_buff_duration_ms: 300_000,
            soldier_price: 100,
            max_target_draws: 64,
        }
    }
}

impl RulesConfig {
    /// Parse rules from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let rules: Self = ron::from_str(text)
            .map_err(|e| CastleError::InvalidState(format!("Failed to parse rules: {e}")))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load rules from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CastleError::InvalidState(format!(
                "Failed to read rules file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_ron_str(&text)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| CastleError::InvalidState(format!("Failed to serialize rules: {e}")))
    }

    /// Reject rule sets the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_target_draws == 0 {
            return Err(CastleError::Validation(
                "max_target_draws must be at least 1".to_string(),
            ));
        }
        if self.battle_buff_duration_ms == 0 {
            return Err(CastleError::Validation(
                "battle_buff_duration_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
