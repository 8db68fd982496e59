//! Pacer benchmark: measure reveal cost per tick.
//!
//! Target: a reveal is far below the 20ms pacing interval, even with a
//! deep queue.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docai_stream::{Pacer, PacingConfig, RenderQueue, Transcript};
use std::time::{Duration, Instant};

fn deep_queue(units: usize, now: Instant) -> RenderQueue {
    let mut queue = RenderQueue::new();
    queue.enqueue((0..units).map(|i| format!("unit {i} with some text ")), now);
    queue
}

fn pacer_reveal(c: &mut Criterion) {
    let mut group = c.benchmark_group("pacer_reveal");
    for graphemes in [1, 8, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(graphemes),
            &graphemes,
            |b, &graphemes| {
                let config = PacingConfig {
                    interval: Duration::from_nanos(1),
                    graphemes_per_tick: graphemes,
                };
                let start = Instant::now();
                let mut queue = deep_queue(10_000, start);
                let mut pacer = Pacer::new(config, start);
                b.iter(|| {
                    if queue.is_empty() {
                        queue = deep_queue(10_000, Instant::now());
                    }
                    black_box(pacer.reveal(&mut queue, Instant::now()))
                });
            },
        );
    }
    group.finish();
}

fn queue_grapheme_count(c: &mut Criterion) {
    let queue = deep_queue(1_000, Instant::now());
    c.bench_function("queue_pending_graphemes_1k", |b| {
        b.iter(|| black_box(queue.pending_graphemes()));
    });
}

fn transcript_append(c: &mut Criterion) {
    c.bench_function("transcript_append_token", |b| {
        let mut transcript = Transcript::new(80, 10_000);
        b.iter(|| transcript.append(black_box("token ")));
    });
}

criterion_group!(benches, pacer_reveal, queue_grapheme_count, transcript_append);
criterion_main!(benches);
