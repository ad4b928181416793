//! Read-only queries against a snapshot.
//!
//! - similar-to-title: neighbours from the similarity matrix
//! - trending: highest popularity
//! - by genre: exact genre match in catalog order
//!
//! Every ordering has an explicit tie-break on the catalog row, so results
//! never depend on sort stability.

use crate::error::{EngineError, Result};
use crate::snapshot::Snapshot;
use data_loader::{MovieId, MovieRecord};
use std::cmp::Ordering;
use tracing::{debug, instrument, warn};

/// Default number of similar movies returned
pub const DEFAULT_SIMILAR_COUNT: usize = 6;

/// Default number of trending movies returned
pub const DEFAULT_TRENDING_COUNT: usize = 9;

/// Default number of movies returned for a genre
pub const DEFAULT_GENRE_COUNT: usize = 9;

/// A recommended movie with the similarity that ranked it
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMovie {
    pub movie: MovieRecord,
    pub score: f32,
}

/// Turn a caller-supplied count into a usable one.
///
/// Negative counts become zero (an empty result) rather than a default,
/// so the caller's intent is never silently replaced.
pub fn clamp_result_count(k: i64) -> usize {
    if k < 0 {
        warn!("Result count {} is negative, clamping to 0", k);
        0
    } else {
        usize::try_from(k).unwrap_or(usize::MAX)
    }
}

/// Descending score, then ascending row
fn by_score_then_row(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// NaN popularity sorts last
fn popularity_key(movie: &MovieRecord) -> f64 {
    if movie.popularity.is_nan() {
        f64::NEG_INFINITY
    } else {
        movie.popularity
    }
}

impl Snapshot {
    /// Movies most similar to `title`, best first, never including `title`.
    ///
    /// Returns fewer than `k` movies when the catalog has fewer than `k + 1`.
    pub fn recommend_similar(&self, title: &str, k: usize) -> Result<Vec<MovieRecord>> {
        Ok(self
            .recommend_similar_scored(title, k)?
            .into_iter()
            .map(|scored| scored.movie)
            .collect())
    }

    /// `recommend_similar`, keyed by movie id
    pub fn recommend_similar_by_id(&self, id: MovieId, k: usize) -> Result<Vec<MovieRecord>> {
        let row = self.row_of_id(id).ok_or_else(|| EngineError::NotFound {
            query: format!("id {id}"),
        })?;
        Ok(self
            .neighbours(row, k)
            .into_iter()
            .map(|(j, _)| self.records[j].clone())
            .collect())
    }

    /// Same ranking as `recommend_similar`, keeping the scores
    #[instrument(skip(self))]
    pub fn recommend_similar_scored(&self, title: &str, k: usize) -> Result<Vec<ScoredMovie>> {
        if title.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "title must not be blank".to_string(),
            ));
        }
        let row = self.row_of_title(title).ok_or_else(|| EngineError::NotFound {
            query: title.to_string(),
        })?;

        let ranked: Vec<ScoredMovie> = self
            .neighbours(row, k)
            .into_iter()
            .map(|(j, score)| ScoredMovie {
                movie: self.records[j].clone(),
                score,
            })
            .collect();
        debug!("{} similar movies for {:?}", ranked.len(), title);
        Ok(ranked)
    }

    /// Top `k` rows of matrix row `row`, excluding `row` itself
    fn neighbours(&self, row: usize, k: usize) -> Vec<(usize, f32)> {
        let mut candidates: Vec<(usize, f32)> = self
            .matrix
            .row(row)
            .iter()
            .copied()
            .enumerate()
            .filter(|&(j, _)| j != row)
            .collect();

        candidates.sort_unstable_by(by_score_then_row);
        candidates.truncate(k);
        candidates
    }

    /// Most popular movies, ties in catalog order
    pub fn trending(&self, k: usize) -> Vec<MovieRecord> {
        let mut rows: Vec<usize> = (0..self.records.len()).collect();
        rows.sort_unstable_by(|&a, &b| {
            popularity_key(&self.records[b])
                .total_cmp(&popularity_key(&self.records[a]))
                .then_with(|| a.cmp(&b))
        });
        rows.into_iter()
            .take(k)
            .map(|row| self.records[row].clone())
            .collect()
    }

    /// First `k` movies, in catalog order, whose genres contain `genre`
    /// exactly (case-sensitive)
    pub fn by_genre(&self, genre: &str, k: usize) -> Vec<MovieRecord> {
        self.records
            .iter()
            .filter(|movie| movie.has_genre(genre))
            .take(k)
            .cloned()
            .collect()
    }

    /// Case-insensitive title search: exact matches first, then substring
    /// matches, each group in catalog order
    pub fn search_titles(&self, query: &str, k: usize) -> Vec<MovieRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(u8, usize)> = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(row, movie)| {
                let title = movie.title.to_lowercase();
                if title == needle {
                    Some((0, row))
                } else if title.contains(&needle) {
                    Some((1, row))
                } else {
                    None
                }
            })
            .collect();
        hits.sort_unstable();
        hits.into_iter()
            .take(k)
            .map(|(_, row)| self.records[row].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::BuildConfig;

    fn movie(id: MovieId, title: &str, genres: &[&str], overview: &str, popularity: f64) -> MovieRecord {
        let mut movie = MovieRecord::new(id, title);
        movie.genres = genres.iter().map(|g| g.to_string()).collect();
        movie.overview = overview.to_string();
        movie.popularity = popularity;
        movie
    }

    fn snapshot() -> Snapshot {
        Snapshot::build(
            vec![
                movie(1, "Star Raid", &["Action"], "space pirates raid a star fortress", 50.0),
                movie(2, "Star Raid II", &["Action"], "space pirates return to raid the fortress", 80.0),
                movie(3, "Garden Party", &["Comedy"], "a garden party goes wrong", 80.0),
                movie(4, "Fortress", &["Action", "Drama"], "siege of a mountain fortress", 10.0),
                movie(5, "Quiet Lake", &["Drama"], "a lake house in winter", 95.0),
            ],
            &BuildConfig::new(),
        )
        .unwrap()
    }

    fn ids(movies: &[MovieRecord]) -> Vec<MovieId> {
        movies.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_recommend_similar_excludes_query() {
        let snapshot = snapshot();
        let results = snapshot.recommend_similar("Star Raid", 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, 2);
        assert!(!ids(&results).contains(&1));
    }

    #[test]
    fn test_scores_descending_with_row_tie_break() {
        let snapshot = snapshot();
        let scored = snapshot.recommend_similar_scored("Star Raid", 10).unwrap();
        assert_eq!(scored.len(), 4);
        for pair in scored.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // Garden Party and Quiet Lake share nothing with Star Raid: tie at 0, row order
        let tail: Vec<MovieId> = scored.iter().rev().take(2).map(|s| s.movie.id).collect();
        assert_eq!(tail, vec![5, 3]);
    }

    #[test]
    fn test_recommend_by_id_matches_title() {
        let snapshot = snapshot();
        assert_eq!(
            snapshot.recommend_similar_by_id(4, 2).unwrap(),
            snapshot.recommend_similar("Fortress", 2).unwrap()
        );
    }

    #[test]
    fn test_not_found_and_blank() {
        let snapshot = snapshot();
        assert!(matches!(
            snapshot.recommend_similar("NoSuchTitle", 6),
            Err(EngineError::NotFound { .. })
        ));
        assert!(matches!(
            snapshot.recommend_similar_by_id(999, 6),
            Err(EngineError::NotFound { .. })
        ));
        assert!(matches!(
            snapshot.recommend_similar("  ", 6),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_k_is_empty_not_error() {
        let snapshot = snapshot();
        assert!(snapshot.recommend_similar("Star Raid", 0).unwrap().is_empty());
        assert!(snapshot.trending(0).is_empty());
        assert!(snapshot.by_genre("Action", 0).is_empty());
    }

    #[test]
    fn test_trending_ties_keep_catalog_order() {
        let snapshot = snapshot();
        assert_eq!(ids(&snapshot.trending(4)), vec![5, 2, 3, 1]);
        assert_eq!(snapshot.trending(DEFAULT_TRENDING_COUNT).len(), 5);
    }

    #[test]
    fn test_by_genre_exact_match() {
        let snapshot = snapshot();
        assert_eq!(ids(&snapshot.by_genre("Action", 9)), vec![1, 2, 4]);
        assert_eq!(ids(&snapshot.by_genre("Action", 2)), vec![1, 2]);
        assert!(snapshot.by_genre("action", 9).is_empty());
        assert!(snapshot.by_genre("Act", 9).is_empty());
    }

    #[test]
    fn test_search_titles() {
        let snapshot = snapshot();
        assert_eq!(ids(&snapshot.search_titles("fortress", 10)), vec![4]);
        assert_eq!(ids(&snapshot.search_titles("star raid", 10)), vec![1, 2]);
        assert_eq!(ids(&snapshot.search_titles("RAID II", 10)), vec![2]);
        assert!(snapshot.search_titles("", 10).is_empty());
    }

    #[test]
    fn test_clamp_result_count() {
        assert_eq!(clamp_result_count(-3), 0);
        assert_eq!(clamp_result_count(0), 0);
        assert_eq!(clamp_result_count(6), 6);
    }
}
