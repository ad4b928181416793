//! # Movie service
//!
//! Composes the pieces a front end needs for one page:
//! 1. Query the current engine snapshot (similar / trending / by genre)
//! 2. Fetch posters for the results concurrently
//! 3. Attach trailer and reviews on the details page
//!
//! Media lookups are best effort. A failed poster or trailer is logged and
//! shown as missing; it never fails the request.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::reviews::{Review, ReviewStore};
use data_loader::{MovieId, MovieRecord};
use engine::RecommendationEngine;
use media_client::MediaLookup;

/// One entry of a result list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub movie: MovieRecord,
    /// Similarity to the query, for similar-to-title results only
    pub score: Option<f32>,
    pub poster_url: Option<String>,
}

/// Everything shown on a movie's own page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoviePage {
    pub movie: MovieRecord,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub reviews: Vec<Review>,
    pub average_rating: Option<f32>,
}

#[derive(Clone)]
pub struct MovieService {
    engine: Arc<RecommendationEngine>,
    media: Arc<dyn MediaLookup>,
    reviews: Arc<ReviewStore>,
}

impl MovieService {
    pub fn new(engine: Arc<RecommendationEngine>, media: Arc<dyn MediaLookup>) -> Self {
        Self {
            engine,
            media,
            reviews: Arc::new(ReviewStore::new()),
        }
    }

    /// Share an existing review store
    pub fn with_reviews(mut self, reviews: Arc<ReviewStore>) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn engine(&self) -> &Arc<RecommendationEngine> {
        &self.engine
    }

    pub fn reviews(&self) -> &ReviewStore {
        &self.reviews
    }

    /// Movies similar to `title`, with posters
    #[instrument(skip(self))]
    pub async fn recommend(&self, title: &str, k: usize) -> Result<Vec<MovieCard>> {
        let start = Instant::now();

        // Ranking sorts a full matrix row, keep it off the async workers
        let scored = tokio::task::spawn_blocking({
            let engine = Arc::clone(&self.engine);
            let title = title.to_string();
            move || engine.recommend_similar_scored(&title, k)
        })
        .await??;

        let cards = self
            .attach_posters(
                scored
                    .into_iter()
                    .map(|scored| (scored.movie, Some(scored.score)))
                    .collect(),
            )
            .await;

        info!(
            "Recommended {} movies for {:?} in {:.2?}",
            cards.len(),
            title,
            start.elapsed()
        );
        Ok(cards)
    }

    /// Most popular movies, with posters
    pub async fn trending(&self, k: usize) -> Vec<MovieCard> {
        let movies = self.engine.trending(k);
        self.attach_posters(movies.into_iter().map(|movie| (movie, None)).collect())
            .await
    }

    /// Movies of one genre in catalog order, with posters
    pub async fn by_genre(&self, genre: &str, k: usize) -> Vec<MovieCard> {
        let movies = self.engine.by_genre(genre, k);
        self.attach_posters(movies.into_iter().map(|movie| (movie, None)).collect())
            .await
    }

    /// Details page: record, poster, trailer and reviews
    #[instrument(skip(self))]
    pub async fn details(&self, movie_id: MovieId) -> Result<MoviePage> {
        let movie = self
            .engine
            .snapshot()
            .get(movie_id)
            .cloned()
            .ok_or(ServiceError::UnknownMovie(movie_id))?;

        let (poster, trailer) = tokio::join!(
            self.media.poster_url(movie_id),
            self.media.trailer_url(movie_id)
        );

        Ok(MoviePage {
            movie,
            poster_url: degrade(poster, "poster", movie_id),
            trailer_url: degrade(trailer, "trailer", movie_id),
            reviews: self.reviews.reviews_for(movie_id),
            average_rating: self.reviews.average_rating(movie_id),
        })
    }

    /// Record a review for a movie of the current snapshot
    pub fn submit_review(
        &self,
        movie_id: MovieId,
        rating: u8,
        text: impl Into<String>,
    ) -> Result<Review> {
        if !self.engine.snapshot().contains(movie_id) {
            return Err(ServiceError::UnknownMovie(movie_id));
        }
        self.reviews.add(movie_id, rating, text)
    }

    /// Title selection list
    pub fn titles(&self) -> Vec<String> {
        let snapshot = self.engine.snapshot();
        snapshot.titles().into_iter().map(str::to_string).collect()
    }

    /// Genre selection list
    pub fn genres(&self) -> Vec<String> {
        let snapshot = self.engine.snapshot();
        snapshot.genres().into_iter().map(str::to_string).collect()
    }

    /// Rebuild the engine from a new catalog. In-flight queries finish on
    /// the old snapshot. Returns the size of the new one.
    pub async fn reload(&self, records: Vec<MovieRecord>) -> Result<usize> {
        let snapshot = tokio::task::spawn_blocking({
            let engine = Arc::clone(&self.engine);
            move || engine.rebuild(records)
        })
        .await??;
        info!(
            "Catalog reloaded: {} movies (generation {})",
            snapshot.len(),
            self.engine.generation()
        );
        Ok(snapshot.len())
    }

    /// Fetch all posters concurrently, keeping the input order
    async fn attach_posters(&self, movies: Vec<(MovieRecord, Option<f32>)>) -> Vec<MovieCard> {
        let lookups: Vec<_> = movies
            .iter()
            .map(|(movie, _)| {
                let media = Arc::clone(&self.media);
                let movie_id = movie.id;
                tokio::spawn(async move { media.poster_url(movie_id).await })
            })
            .collect();

        let mut cards = Vec::with_capacity(movies.len());
        for ((movie, score), lookup) in movies.into_iter().zip(lookups) {
            let poster_url = match lookup.await {
                Ok(result) => degrade(result, "poster", movie.id),
                Err(e) => {
                    warn!("Poster task for movie {} failed: {}", movie.id, e);
                    None
                }
            };
            cards.push(MovieCard {
                movie,
                score,
                poster_url,
            });
        }
        debug!("Attached posters to {} movies", cards.len());
        cards
    }
}

fn degrade<E: Display>(
    result: std::result::Result<Option<String>, E>,
    what: &str,
    movie_id: MovieId,
) -> Option<String> {
    match result {
        Ok(url) => url,
        Err(e) => {
            warn!("{} lookup for movie {} failed: {}", what, movie_id, e);
            None
        }
    }
}
