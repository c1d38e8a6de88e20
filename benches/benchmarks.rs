use criterion::{criterion_group, criterion_main, Criterion};
use duel_chess::color::Team;
use duel_chess::encode::PackedMove;
use duel_chess::game::Game;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

/// Play ~20 random legal moves on a fresh game to create a realistic
/// mid-game position. Uses a fixed seed for reproducibility across runs.
fn setup_midgame() -> Game {
    let mut game = Game::new(Team::White);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let moves = game.legal_moves();
        if moves.is_empty() {
            break;
        }
        let (from, to) = *moves.choose(&mut rng).expect("non-empty move list");
        game.move_piece(from, to);
    }
    game
}

// ---------------------------------------------------------------------------
// Microbenchmarks
// ---------------------------------------------------------------------------

fn bench_legal_moves(c: &mut Criterion) {
    let game = setup_midgame();
    c.bench_function("legal_moves", |b| b.iter(|| black_box(game.legal_moves())));
}

fn bench_king_is_safe(c: &mut Criterion) {
    let game = setup_midgame();
    c.bench_function("king_is_safe", |b| {
        b.iter(|| black_box(game.king_is_safe(game.turn())))
    });
}

fn bench_mate_status(c: &mut Criterion) {
    let game = setup_midgame();
    c.bench_function("mate_status", |b| {
        b.iter(|| black_box(game.mate_status(game.turn())))
    });
}

fn bench_move_piece(c: &mut Criterion) {
    let game = setup_midgame();
    let moves = game.legal_moves();
    let (from, to) = *moves.first().expect("midgame has legal moves");
    c.bench_function("move_piece", |b| {
        b.iter_batched(
            || game.clone(),
            |mut g| {
                g.move_piece(from, to);
                black_box(&g);
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_pack_unpack(c: &mut Criterion) {
    let game = setup_midgame();
    let moves = game.legal_moves();
    let (from, to) = *moves.first().expect("midgame has legal moves");
    c.bench_function("pack_unpack", |b| {
        b.iter(|| {
            let packed = PackedMove::pack(black_box(from), black_box(to), true);
            black_box(packed.unpack(true).expect("round-trip"))
        })
    });
}

// ---------------------------------------------------------------------------
// Integration benchmarks
// ---------------------------------------------------------------------------

fn bench_random_playout(c: &mut Criterion) {
    c.bench_function("random_playout", |b| {
        b.iter(|| {
            let mut game = Game::new(Team::White);
            let mut rng = StdRng::seed_from_u64(123);
            for _ in 0..60 {
                let moves = game.legal_moves();
                if moves.is_empty() {
                    break;
                }
                let (from, to) = *moves.choose(&mut rng).expect("non-empty move list");
                game.move_piece(from, to);
            }
            black_box(game.moves_applied())
        })
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets =
        bench_legal_moves,
        bench_king_is_safe,
        bench_mate_status,
        bench_move_piece,
        bench_pack_unpack,
);
criterion_group!(
    name = playouts;
    config = Criterion::default().sample_size(1_000);
    targets =
        bench_random_playout,
);
criterion_main!(benches, playouts);
