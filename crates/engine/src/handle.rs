//! Shared handle to the current snapshot.
//!
//! Readers take an `Arc<Snapshot>` and query it without holding any lock;
//! a rebuild constructs the next snapshot off to the side and swaps the
//! pointer. In-flight reads keep the snapshot they started with.

use crate::error::Result;
use crate::ranker::ScoredMovie;
use crate::snapshot::{BuildConfig, Snapshot};
use data_loader::{MovieId, MovieRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Publishes immutable snapshots to any number of concurrent readers
#[derive(Debug)]
pub struct RecommendationEngine {
    current: RwLock<Arc<Snapshot>>,
    config: BuildConfig,
    generation: AtomicU64,
}

impl RecommendationEngine {
    /// Build the first snapshot from `records`
    pub fn build(records: Vec<MovieRecord>, config: BuildConfig) -> Result<Self> {
        let snapshot = Snapshot::build(records, &config)?;
        Ok(Self::from_snapshot(snapshot, config))
    }

    pub fn from_snapshot(snapshot: Snapshot, config: BuildConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            config,
            generation: AtomicU64::new(1),
        }
    }

    /// The snapshot readers should query right now
    pub fn snapshot(&self) -> Arc<Snapshot> {
        // A poisoned lock still holds a complete snapshot: the guarded value
        // is only ever replaced whole
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Number of snapshots published so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Swap in `snapshot` and return the one it replaced
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.swap(Arc::new(snapshot))
    }

    /// Full rebuild from a new catalog, returning the snapshot it built.
    ///
    /// On error the current snapshot stays published.
    pub fn rebuild(&self, records: Vec<MovieRecord>) -> Result<Arc<Snapshot>> {
        let next = Arc::new(Snapshot::build(records, &self.config)?);
        self.swap(Arc::clone(&next));
        Ok(next)
    }

    fn swap(&self, next: Arc<Snapshot>) -> Arc<Snapshot> {
        // The counter moves under the write lock so it never runs ahead of
        // or behind the published snapshot
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(guard);
        info!("Published snapshot generation {}", generation);
        previous
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn recommend_similar(&self, title: &str, k: usize) -> Result<Vec<MovieRecord>> {
        self.snapshot().recommend_similar(title, k)
    }

    pub fn recommend_similar_scored(&self, title: &str, k: usize) -> Result<Vec<ScoredMovie>> {
        self.snapshot().recommend_similar_scored(title, k)
    }

    pub fn recommend_similar_by_id(&self, id: MovieId, k: usize) -> Result<Vec<MovieRecord>> {
        self.snapshot().recommend_similar_by_id(id, k)
    }

    pub fn trending(&self, k: usize) -> Vec<MovieRecord> {
        self.snapshot().trending(k)
    }

    pub fn by_genre(&self, genre: &str, k: usize) -> Vec<MovieRecord> {
        self.snapshot().by_genre(genre, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn movie(id: MovieId, title: &str, overview: &str) -> MovieRecord {
        let mut movie = MovieRecord::new(id, title);
        movie.genres = vec!["Drama".to_string()];
        movie.overview = overview.to_string();
        movie
    }

    #[test]
    fn test_rebuild_swaps_snapshot() {
        let engine = RecommendationEngine::build(
            vec![movie(1, "One", "farm"), movie(2, "Two", "city")],
            BuildConfig::new(),
        )
        .unwrap();
        assert_eq!(engine.generation(), 1);

        let before = engine.snapshot();
        let after = engine
            .rebuild(vec![
                movie(1, "One", "farm"),
                movie(2, "Two", "city"),
                movie(3, "Three", "farm animals"),
            ])
            .unwrap();

        // Old readers keep their view, new readers see the new one
        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 3);
        assert_eq!(engine.snapshot().len(), 3);
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.recommend_similar("One", 1).unwrap()[0].id, 3);
    }

    #[test]
    fn test_failed_rebuild_keeps_current() {
        let engine =
            RecommendationEngine::build(vec![movie(1, "One", "farm")], BuildConfig::new()).unwrap();
        let err = engine.rebuild(Vec::new()).unwrap_err();
        assert_eq!(err, EngineError::EmptyCorpus);
        assert_eq!(engine.snapshot().len(), 1);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn test_concurrent_readers_during_publish() {
        let engine = Arc::new(
            RecommendationEngine::build(
                vec![movie(1, "One", "farm"), movie(2, "Two", "farm city")],
                BuildConfig::new(),
            )
            .unwrap(),
        );

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let engine = Arc::clone(&engine);
                scope.spawn(move || {
                    for _ in 0..200 {
                        let snapshot = engine.snapshot();
                        // Every structure of one snapshot has the same row count
                        let n = snapshot.len();
                        assert_eq!(snapshot.documents().len(), n);
                        assert_eq!(snapshot.vector_space().len(), n);
                        assert_eq!(snapshot.similarity_matrix().len(), n);
                    }
                });
            }
            scope.spawn(|| {
                for round in 0..20u32 {
                    let mut records = vec![movie(1, "One", "farm")];
                    records.extend((0..round).map(|i| movie(100 + i, &format!("M{i}"), "farm city")));
                    engine.rebuild(records).unwrap();
                }
            });
        });

        assert_eq!(engine.generation(), 21);
    }

    #[test]
    fn test_publish_returns_previous() {
        let engine =
            RecommendationEngine::build(vec![movie(1, "One", "farm")], BuildConfig::new()).unwrap();
        let next = Snapshot::build(
            vec![movie(1, "One", "farm"), movie(2, "Two", "city")],
            engine.config(),
        )
        .unwrap();

        let previous = engine.publish(next);
        assert_eq!(previous.len(), 1);
        assert_eq!(engine.snapshot().len(), 2);
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn test_concurrent_rebuilds_return_own_snapshot() {
        let engine =
            RecommendationEngine::build(vec![movie(1, "One", "farm")], BuildConfig::new()).unwrap();

        std::thread::scope(|scope| {
            for size in [2u32, 5] {
                let engine = &engine;
                scope.spawn(move || {
                    for _ in 0..50 {
                        let records = (0..size)
                            .map(|i| movie(i + 1, &format!("M{i}"), "farm city"))
                            .collect();
                        let built = engine.rebuild(records).unwrap();
                        assert_eq!(built.len(), size as usize);
                    }
                });
            }
        });

        assert_eq!(engine.generation(), 101);
        let len = engine.snapshot().len();
        assert!(len == 2 || len == 5);
    }
}
