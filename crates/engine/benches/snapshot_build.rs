//! Benchmarks for the snapshot build and the similar-to-title query
//!
//! Run with: cargo bench --package engine
//!
//! Uses a synthetic catalog so no data files are needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::MovieRecord;
use engine::{BuildConfig, Snapshot, DEFAULT_SIMILAR_COUNT};

const GENRES: &[&str] = &["Action", "Drama", "Comedy", "Horror", "Romance", "Thriller"];
const WORDS: &[&str] = &[
    "heist", "galaxy", "detective", "wedding", "zombie", "robot", "island", "war", "ghost",
    "dragon", "spy", "prison", "race", "school", "ocean", "desert", "vampire", "king",
];

fn synthetic_catalog(n: u32) -> Vec<MovieRecord> {
    (0..n)
        .map(|i| {
            let i_us = i as usize;
            let mut movie = MovieRecord::new(i, format!("Movie {i}"));
            movie.genres = vec![GENRES[i_us % GENRES.len()].to_string()];
            movie.cast = vec![format!("Actor{}", i % 97), format!("Actor{}", i % 89)];
            movie.directors = vec![format!("Director{}", i % 41)];
            movie.keywords = (0..4)
                .map(|k| WORDS[(i_us * 7 + k * 3) % WORDS.len()].to_string())
                .collect();
            movie.overview = (0..12)
                .map(|k| WORDS[(i_us + k * 5) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ");
            movie.popularity = (i % 113) as f64;
            movie
        })
        .collect()
}

fn bench_snapshot_build(c: &mut Criterion) {
    let catalog = synthetic_catalog(1000);
    let config = BuildConfig::new();

    c.bench_function("snapshot_build_1000", |b| {
        b.iter(|| {
            let snapshot = Snapshot::build(black_box(catalog.clone()), &config).unwrap();
            black_box(snapshot)
        })
    });
}

fn bench_recommend_similar(c: &mut Criterion) {
    let snapshot = Snapshot::build(synthetic_catalog(2000), &BuildConfig::new()).unwrap();

    c.bench_function("recommend_similar", |b| {
        b.iter(|| {
            let results = snapshot
                .recommend_similar(black_box("Movie 42"), black_box(DEFAULT_SIMILAR_COUNT))
                .unwrap();
            black_box(results)
        })
    });
}

criterion_group!(benches, bench_snapshot_build, bench_recommend_similar);
criterion_main!(benches);
