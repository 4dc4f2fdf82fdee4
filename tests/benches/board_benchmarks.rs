//! # Threadloom Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | tl-02 Board Index | ingest in creation order | linear in messages |
//! | tl-02 Board Index | ingest in reverse order | ghosts resolved without rescans |
//! | tl-04 Subscribed View | thread listing | one graph walk per query |
//! | Engine | identity deletion | proportional to the author's footprint |

#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::Message;
use std::time::Duration;
use tl_02_board_index::BoardGraph;
use tl_tests::fixtures::{board, build_forest, engine, Blueprint, BOARDS, VIEWER};

fn forest(len: usize) -> Vec<Message> {
    let mut rng = StdRng::seed_from_u64(42);
    let blueprints: Vec<Blueprint> = (0..len)
        .map(|i| Blueprint {
            author: rng.gen_range(0..8),
            parent: if i % 10 == 0 { None } else { Some(rng.gen_range(0..i.max(1))) },
            boards: 1,
        })
        .collect();
    build_forest(&blueprints)
}

// ============================================================================
// TL-02: Board Index
// ============================================================================

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("tl-02-ingest");
    group.measurement_time(Duration::from_secs(10));

    for size in [100, 1_000, 5_000] {
        let messages = forest(size);
        let mut reversed = messages.clone();
        reversed.reverse();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("forward", size), &messages, |b, messages| {
            b.iter(|| {
                let mut graph = BoardGraph::new(board(BOARDS[0]));
                for message in messages {
                    let _ = graph.ingest(message.clone());
                }
                black_box(graph.message_count())
            })
        });
        group.bench_with_input(BenchmarkId::new("reverse", size), &reversed, |b, messages| {
            b.iter(|| {
                let mut graph = BoardGraph::new(board(BOARDS[0]));
                for message in messages {
                    let _ = graph.ingest(message.clone());
                }
                black_box(graph.message_count())
            })
        });
    }

    group.finish();
}

// ============================================================================
// TL-04: Subscribed View
// ============================================================================

fn bench_thread_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("tl-04-listing");

    for size in [1_000, 5_000] {
        let engine = engine();
        for message in forest(size) {
            let _ = engine.on_message_received(message, None);
        }
        let name = board(BOARDS[0]);

        group.bench_function(BenchmarkId::new("get_threads", size), |b| {
            b.iter(|| black_box(engine.get_threads(&VIEWER, &name).map(|l| l.len())))
        });
    }

    group.finish();
}

// ============================================================================
// ENGINE: Identity Deletion
// ============================================================================

fn bench_identity_deletion(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine-deletion");
    let messages = forest(2_000);

    group.bench_function("delete_one_of_eight_authors", |b| {
        b.iter_batched(
            || {
                let engine = engine();
                for message in &messages {
                    let _ = engine.on_message_received(message.clone(), None);
                }
                engine
            },
            |engine| black_box(engine.on_identity_deletion(&messages[0].author()).messages_removed),
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_thread_listing, bench_identity_deletion);
criterion_main!(benches);
