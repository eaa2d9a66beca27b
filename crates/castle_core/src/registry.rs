//! Keyed storage for castle records with per-size population caps.
//!
//! Records can be temporarily extracted with [`CastleRegistry::remove`] and
//! must later be handed back with [`CastleRegistry::reinsert`]. While a record
//! is extracted no other operation can read or mutate it, which is how
//! two-castle operations get exclusive access to both participants.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::castle::{CastleId, CastleRecord, CastleSize};
use crate::error::{CastleError, Result};
use crate::random::RandomSource;

/// Storage for all castles.
///
/// Uses a `HashMap` for O(1) lookup by id, with deterministic iteration via
/// sorted keys where order matters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CastleRegistry {
    /// Map of castle id to record.
    castles: HashMap<CastleId, CastleRecord>,
    /// Live castles per size class, indexed by [`CastleSize::index`].
    population: [u64; 3],
    /// Every registered id in registration order, for uniform selection.
    ids: Vec<CastleId>,
    /// Ids currently removed and awaiting reinsertion.
    extracted: BTreeSet<CastleId>,
    /// Next id to hand out.
    next_id: u64,
}

impl CastleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Reserve a fresh identifier.
    pub fn allocate_id(&mut self) -> CastleId {
        let id = CastleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Whether another castle of `size` fits under the population cap.
    #[must_use]
    pub fn has_capacity(&self, size: CastleSize) -> bool {
        self.population(size) < size.population_cap()
    }

    /// Register a new castle.
    ///
    /// # Errors
    ///
    /// [`CastleError::CapacityExceeded`] if the size class is full,
    /// [`CastleError::Validation`] if the id is already in use.
    pub fn register(&mut self, record: CastleRecord) -> Result<CastleId> {
        let size = record.size;
        if !self.has_capacity(size) {
            return Err(CastleError::CapacityExceeded {
                size,
                limit: size.population_cap(),
            });
        }
        let id = record.id;
        if self.castles.contains_key(&id) || self.extracted.contains(&id) {
            return Err(CastleError::Validation(format!("castle {id} already registered")));
        }

        self.castles.insert(id, record);
        self.population[size.index()] += 1;
        self.ids.push(id);
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(id)
    }

    /// Get a castle by id.
    #[must_use]
    pub fn get(&self, id: CastleId) -> Option<&CastleRecord> {
        self.castles.get(&id)
    }

    /// Get a mutable reference to a castle by id.
    pub fn get_mut(&mut self, id: CastleId) -> Option<&mut CastleRecord> {
        self.castles.get_mut(&id)
    }

    /// Extract a castle for exclusive use.
    ///
    /// Population counters and the selection list are left alone: the castle
    /// is still registered, just temporarily unavailable.
    ///
    /// # Errors
    ///
    /// [`CastleError::NotFound`] if the castle is unknown or already extracted.
    pub fn remove(&mut self, id: CastleId) -> Result<CastleRecord> {
        let record = self.castles.remove(&id).ok_or(CastleError::NotFound(id))?;
        self.extracted.insert(id);
        Ok(record)
    }

    /// Return a previously extracted castle.
    ///
    /// # Errors
    ///
    /// [`CastleError::InvalidState`] if the castle was not extracted.
    pub fn reinsert(&mut self, record: CastleRecord) -> Result<()> {
        if !self.extracted.remove(&record.id) {
            return Err(CastleError::InvalidState(format!(
                "castle {} was not extracted",
                record.id
            )));
        }
        self.castles.insert(record.id, record);
        Ok(())
    }

    /// Whether a castle is currently extracted.
    #[must_use]
    pub fn is_extracted(&self, id: CastleId) -> bool {
        self.extracted.contains(&id)
    }

    /// Draw a uniformly random castle other than `excluding`.
    ///
    /// Rejection sampling over the registration list, giving up after
    /// `max_draws` attempts.
    ///
    /// # Errors
    ///
    /// [`CastleError::InsufficientPopulation`] with fewer than two castles,
    /// [`CastleError::TargetSelectionExhausted`] if every draw hit `excluding`.
    pub fn random_other(
        &self,
        excluding: CastleId,
        rng: &mut dyn RandomSource,
        max_draws: u32,
    ) -> Result<CastleId> {
        if self.ids.len() < 2 {
            return Err(CastleError::InsufficientPopulation {
                available: self.ids.len(),
            });
        }

        let range = self.ids.len() as u64;
        for _ in 0..max_draws {
            let index = usize::try_from(rng.next_index(range)).unwrap_or(usize::MAX);
            if let Some(&candidate) = self.ids.get(index) {
                if candidate != excluding {
                    return Ok(candidate);
                }
            }
        }

        Err(CastleError::TargetSelectionExhausted {
            castle: excluding,
            draws: max_draws,
        })
    }

    /// Live castles of one size class.
    #[must_use]
    pub fn population(&self, size: CastleSize) -> u64 {
        self.population[size.index()]
    }

    /// Number of registered castles, extracted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no castle is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in registration order.
    #[must_use]
    pub fn ids(&self) -> &[CastleId] {
        &self.ids
    }

    /// Sorted ids of castles currently present, for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<CastleId> {
        let mut ids: Vec<_> = self.castles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of castles held by `owner`, sorted.
    #[must_use]
    pub fn castles_of(&self, owner: &str) -> Vec<CastleId> {
        let mut ids: Vec<_> = self
            .castles
            .values()
            .filter(|castle| castle.owner == owner)
            .map(|castle| castle.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
