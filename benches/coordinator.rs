//! Benchmarks for the hot paths behind every move and snapshot.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use coin_grid::core::rng::DeterministicRng;
use coin_grid::game::{BoardConfig, CoinField, PlayerRegistry};

fn bench_repopulate(c: &mut Criterion) {
    let board = BoardConfig::default();
    let mut rng = DeterministicRng::new(42);
    let mut field = CoinField::new(board);

    c.bench_function("coin_field_repopulate_100", |b| {
        b.iter(|| {
            field.repopulate(&mut rng);
            black_box(field.len())
        })
    });
}

fn bench_ranked_scores(c: &mut Criterion) {
    let board = BoardConfig::default();
    let mut rng = DeterministicRng::new(7);
    let mut registry = PlayerRegistry::new();

    for i in 0..1000u32 {
        let name = format!("player-{}", i);
        if registry.register(&name, &mut rng, &board).is_ok() {
            let _ = registry.add_score(&name, i % 37);
        }
    }

    c.bench_function("ranked_scores_1000_players", |b| {
        b.iter(|| black_box(registry.ranked_scores()))
    });
}

criterion_group!(benches, bench_repopulate, bench_ranked_scores);
criterion_main!(benches);
