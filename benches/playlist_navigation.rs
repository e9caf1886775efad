// SPDX-License-Identifier: MPL-2.0
//! Benchmarks for playlist navigation operations.
//!
//! Measures the pure cursor moves and the snapshot recomputation that
//! happens on every transition.

use criterion::{criterion_group, criterion_main, Criterion};
use iced_reel::playlist::{Playlist, VideoEntry};
use std::hint::black_box;

fn sample_playlist(len: usize) -> Playlist {
    let entries = (0..len)
        .map(|i| VideoEntry::new(format!("Video {}", i), format!("/videos/{}.mp4", i)))
        .collect();
    Playlist::new(entries).expect("construction failed")
}

/// Benchmark cursor movement without any snapshot work.
fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("playlist_navigation");

    group.bench_function("advance_round_trip", |b| {
        let mut playlist = sample_playlist(100);
        b.iter(|| {
            while playlist.advance(1) {}
            while playlist.advance(-1) {}
            black_box(playlist.index());
        });
    });

    group.finish();
}

/// Benchmark enablement recomputation at the boundaries.
fn bench_enablement(c: &mut Criterion) {
    let mut group = c.benchmark_group("playlist_navigation");

    let playlist = sample_playlist(100);
    group.bench_function("enablement_flags", |b| {
        b.iter(|| {
            black_box(playlist.has_previous());
            black_box(playlist.has_next());
            black_box(playlist.current().display_name());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_advance, bench_enablement);
criterion_main!(benches);
