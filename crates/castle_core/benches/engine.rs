//! Engine benchmarks for castle_core.
//!
//! Run with: `cargo bench -p castle_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use castle_core::castle::{CastleId, CastleSize, Race};
use castle_core::economy::minutes;
use castle_core::engine::Engine;
use castle_test_utils::determinism::{run_script, scripted_commands};

fn populated_engine(castles: u64) -> Engine {
    let mut engine = Engine::with_seed(1);
    for i in 0..castles {
        let size = CastleSize::ALL[(i % 3) as usize];
        let race = Race::ALL[(i % 5) as usize];
        engine
            .register_new(format!("p{i}"), format!("c{i}"), size, race, 0)
            .unwrap();
    }
    engine
}

/// Settling every castle after a round of battles.
pub fn settle_benchmark(c: &mut Criterion) {
    let mut engine = populated_engine(50);
    for i in 0..20 {
        let _ = engine.battle(CastleId(i % 50 + 1), minutes(i));
    }

    c.bench_function("settle_50_castles", |b| {
        b.iter_batched(
            || engine.clone(),
            |mut engine| {
                for id in engine.registry().sorted_ids() {
                    black_box(engine.settle(id, minutes(30)).unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

/// A single battle between random opponents.
pub fn battle_benchmark(c: &mut Criterion) {
    let engine = populated_engine(200);
    let attacker = CastleId(1);

    c.bench_function("battle_random_opponent", |b| {
        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.battle(attacker, minutes(10))),
            BatchSize::SmallInput,
        );
    });
}

/// A full scripted game.
pub fn script_benchmark(c: &mut Criterion) {
    let script = scripted_commands(3, 30, 1_000);

    c.bench_function("scripted_game_1000_commands", |b| {
        b.iter(|| black_box(run_script(3, &script).state_hash()));
    });
}

criterion_group!(benches, settle_benchmark, battle_benchmark, script_benchmark);
criterion_main!(benches);
