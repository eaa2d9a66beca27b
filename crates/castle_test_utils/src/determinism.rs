//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the engine produces identical
//! results given identical seeds and command streams.
//!
//! # Testing Strategy
//!
//! Replays and balance runs rely on the engine being fully deterministic.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: all growth and accrual uses integer ceiling
//!   division instead.
//!
//! - **HashMap iteration order**: the registry keeps castles in a map, so
//!   hashing always walks sorted castle ids.
//!
//! - **System randomness**: opponents are drawn from a seeded source that is
//!   part of the engine state.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual operations (settle, recruit, battle)
//! 2. **Property tests**: random scripts must still replay identically
//! 3. **Parallel tests**: running N engines on threads all match

use std::thread;

use castle_core::castle::{CastleId, CastleSize, Race};
use castle_core::economy::minutes;
use castle_core::engine::{Engine, EngineCommand};
use castle_core::random::{RandomSource, SeededRandom};
use castle_core::replay::ReplayCommand;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps executed per run.
    pub steps: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, steps: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            steps,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Engine is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Example
///
/// ```
/// use castle_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..steps {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    DeterminismResult::from_hashes(hashes, steps)
}

/// Generate a seeded command script.
///
/// The script registers `castles` castles at time zero (cycling through sizes
/// and races), then issues `rounds` commands half a minute apart. Each command
/// picks a castle and an operation from a generator seeded with `seed`.
#[must_use]
pub fn scripted_commands(seed: u64, castles: u64, rounds: u64) -> Vec<ReplayCommand> {
    let mut rng = SeededRandom::new(seed);
    let mut script = Vec::new();

    for i in 0..castles {
        let size = CastleSize::ALL[(i % 3) as usize];
        let race = Race::ALL[(rng.next_index(5)) as usize];
        script.push(ReplayCommand {
            at: 0,
            command: EngineCommand::Register {
                owner: format!("player-{i}"),
                name: format!("castle-{i}"),
                size,
                race,
            },
        });
    }

    if castles == 0 {
        return script;
    }

    for round in 1..=rounds {
        let at = round * minutes(1) / 2;
        let castle = CastleId(rng.next_index(castles) + 1);
        let command = match rng.next_index(4) {
            0 => EngineCommand::Settle(castle),
            1 => EngineCommand::Recruit {
                castle,
                count: rng.next_index(5) + 1,
            },
            2 => EngineCommand::Upgrade(castle),
            _ => EngineCommand::Battle(castle),
        };
        script.push(ReplayCommand { at, command });
    }
    script
}

/// Execute `script` on a fresh engine seeded with `seed`.
///
/// Failed commands are part of the game and are ignored.
#[must_use]
pub fn run_script(seed: u64, script: &[ReplayCommand]) -> Engine {
    let mut engine = Engine::with_seed(seed);
    for record in script {
        if let Err(err) = engine.apply(&record.command, record.at) {
            tracing::trace!(at = record.at, %err, "Scripted command failed");
        }
    }
    engine
}

/// Run the same script `runs` times and compare final state hashes.
#[must_use]
pub fn verify_engine_determinism(
    seed: u64,
    script: &[ReplayCommand],
    runs: usize,
) -> DeterminismResult {
    let hashes = (0..runs)
        .map(|_| run_script(seed, script).state_hash())
        .collect();
    DeterminismResult::from_hashes(hashes, script.len() as u64)
}

/// Run the same script on `num_runs` scoped threads.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// per-thread hasher state.
#[must_use]
pub fn run_parallel_engines(
    seed: u64,
    script: &[ReplayCommand],
    num_runs: usize,
) -> DeterminismResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| s.spawn(|| run_script(seed, script).state_hash()))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    DeterminismResult::from_hashes(hashes, script.len() as u64)
}

/// Execute a script on two engines side by side, finding the first command
/// after which their hashes differ.
///
/// Returns `None` if they never diverge.
#[must_use]
pub fn find_first_divergence(seed: u64, script: &[ReplayCommand]) -> Option<usize> {
    let mut first = Engine::with_seed(seed);
    let mut second = Engine::with_seed(seed);

    for (index, record) in script.iter().enumerate() {
        let a = first.apply(&record.command, record.at);
        let b = second.apply(&record.command, record.at);
        if a != b || first.state_hash() != second.state_hash() {
            return Some(index);
        }
    }
    None
}

/// Verify that a snapshot round trip preserves engine state exactly.
#[must_use]
pub fn verify_snapshot_determinism(engine: &Engine) -> bool {
    let Ok(bytes) = engine.serialize() else {
        return false;
    };
    match Engine::deserialize(&bytes) {
        Ok(restored) => restored.state_hash() == engine.state_hash(),
        Err(_) => false,
    }
}

/// Proptest strategies for engine testing.
pub mod strategies {
    use proptest::prelude::*;

    use castle_core::castle::{CastleSize, Race, Timestamp};
    use castle_core::economy::minutes;

    use crate::fixtures::CastleSetup;

    /// Any castle size.
    pub fn arb_size() -> impl Strategy<Value = CastleSize> {
        prop_oneof![
            Just(CastleSize::Small),
            Just(CastleSize::Middle),
            Just(CastleSize::Big),
        ]
    }

    /// Any race.
    pub fn arb_race() -> impl Strategy<Value = Race> {
        prop_oneof![
            Just(Race::Human),
            Just(Race::Elf),
            Just(Race::Orc),
            Just(Race::Goblin),
            Just(Race::Undead),
        ]
    }

    /// A castle setup with a generated owner.
    pub fn arb_castle_setup() -> impl Strategy<Value = CastleSetup> {
        ("[a-z]{1,8}", arb_size(), arb_race())
            .prop_map(|(owner, size, race)| CastleSetup::new(&owner, size, race))
    }

    /// A roster of between 2 and `max_castles` castles.
    pub fn arb_roster(max_castles: usize) -> impl Strategy<Value = Vec<CastleSetup>> {
        proptest::collection::vec(arb_castle_setup(), 2..max_castles.max(3))
    }

    /// A duration of up to a day, in milliseconds.
    pub fn arb_duration() -> impl Strategy<Value = Timestamp> {
        0..minutes(24 * 60)
    }

    /// A split of a duration into two ordered points `(mid, end)`.
    pub fn arb_split() -> impl Strategy<Value = (Timestamp, Timestamp)> {
        arb_duration().prop_flat_map(|end| (0..=end, Just(end)))
    }

    /// Number of soldiers to recruit in one call.
    pub fn arb_recruit_count() -> impl Strategy<Value = u64> {
        1u64..50
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::engine_with;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_deterministic_reports_divergence() {
        DeterminismResult::from_hashes(vec![1, 2], 0).assert_deterministic();
    }

    #[test]
    fn test_script_is_reproducible() {
        assert_eq!(scripted_commands(5, 6, 50), scripted_commands(5, 6, 50));
        assert_ne!(scripted_commands(5, 6, 50), scripted_commands(6, 6, 50));
    }

    #[test]
    fn test_script_without_castles_only_registers() {
        assert!(scripted_commands(1, 0, 10).is_empty());
    }

    #[test]
    fn test_engine_determinism() {
        let script = scripted_commands(42, 8, 200);
        verify_engine_determinism(42, &script, 3).assert_deterministic();
    }

    #[test]
    fn test_parallel_engines_match() {
        let script = scripted_commands(7, 10, 300);
        let result = run_parallel_engines(7, &script, 4);
        result.assert_deterministic();
        assert_eq!(result.hashes[0], run_script(7, &script).state_hash());
    }

    #[test]
    fn test_no_divergence() {
        let script = scripted_commands(9, 5, 100);
        assert_eq!(find_first_divergence(9, &script), None);
    }

    #[test]
    fn test_snapshot_after_script() {
        let script = scripted_commands(3, 6, 120);
        assert!(verify_snapshot_determinism(&run_script(3, &script)));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let script = scripted_commands(1, 6, 200);
        assert_ne!(
            run_script(1, &script).state_hash(),
            run_script(2, &script).state_hash()
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_scripts_replay_identically(seed in any::<u64>(), castles in 2u64..12, rounds in 0u64..150) {
            let script = scripted_commands(seed, castles, rounds);
            prop_assert!(verify_engine_determinism(seed, &script, 2).is_deterministic);
        }

        #[test]
        fn prop_roster_registers(roster in arb_roster(10)) {
            let (engine, ids) = engine_with(0, &roster, 0);
            prop_assert_eq!(ids.len(), roster.len());
            prop_assert_eq!(engine.registry().len(), roster.len());
        }
    }
}
