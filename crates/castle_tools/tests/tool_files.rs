//! File-level tests for the tools: replays, snapshots and batch results
//! written by one command and read back by another.

use castle_tools::batch::{run_batch, BatchConfig, BatchResults};
use castle_tools::inspect::{inspect_snapshot, save_snapshot, verify_replay};
use castle_tools::skirmish::{run_skirmish, SkirmishConfig};
use castle_tools::ToolError;

fn config(seed: u64) -> SkirmishConfig {
    SkirmishConfig {
        seed,
        castles: 8,
        rounds: 30,
        ..Default::default()
    }
}

#[test]
fn test_saved_replay_verifies() {
    let skirmish = run_skirmish(&config(21)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.replay");
    skirmish.replay.save(&path).unwrap();

    let check = verify_replay(&path).unwrap();
    assert_eq!(check.seed, 21);
    assert_eq!(check.recorded_hash, Some(skirmish.report.final_hash));
    assert_eq!(check.replayed_hash, skirmish.report.final_hash);
    assert_eq!(check.commands, skirmish.replay.commands.len());
}

#[test]
fn test_tampered_replay_is_rejected() {
    let mut skirmish = run_skirmish(&config(22)).unwrap();
    skirmish.replay.final_hash = Some(skirmish.report.final_hash ^ 1);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.replay");
    skirmish.replay.save(&path).unwrap();

    assert!(matches!(verify_replay(&path), Err(ToolError::Engine(_))));
}

#[test]
fn test_snapshot_matches_report() {
    let skirmish = run_skirmish(&config(23)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.snap");
    save_snapshot(&skirmish.engine, &path).unwrap();

    let report = inspect_snapshot(&path, None).unwrap();
    assert_eq!(report.state_hash, skirmish.report.final_hash);
    assert_eq!(report.castles, skirmish.report.standings);
}

#[test]
fn test_batch_results_round_trip() {
    let results = run_batch(BatchConfig {
        games: 3,
        castles: 4,
        rounds: 8,
        ..Default::default()
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("batch.json");
    results.save(&path).unwrap();

    let loaded = BatchResults::load(&path).unwrap();
    assert_eq!(loaded.games, results.games);
    assert_eq!(loaded.races, results.races);
}
