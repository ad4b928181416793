//! User reviews, kept apart from the recommendation snapshot.
//!
//! Reviews never influence recommendations. The store is shared between
//! request handlers, so it is a `DashMap` rather than a locked `HashMap`.

use crate::error::{Result, ServiceError};
use dashmap::DashMap;
use data_loader::MovieId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Highest accepted rating
pub const MAX_RATING: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub rating: u8,
    pub text: String,
}

/// Append-only reviews per movie
#[derive(Debug, Default)]
pub struct ReviewStore {
    reviews: DashMap<MovieId, Vec<Review>>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a review. Ratings above `MAX_RATING` are rejected.
    pub fn add(&self, movie_id: MovieId, rating: u8, text: impl Into<String>) -> Result<Review> {
        if rating > MAX_RATING {
            return Err(ServiceError::InvalidRating(rating));
        }
        let review = Review {
            rating,
            text: text.into(),
        };
        self.reviews
            .entry(movie_id)
            .or_default()
            .push(review.clone());
        debug!("Stored review for movie {}", movie_id);
        Ok(review)
    }

    /// Reviews for a movie in submission order
    pub fn reviews_for(&self, movie_id: MovieId) -> Vec<Review> {
        self.reviews
            .get(&movie_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Mean rating, `None` without reviews
    pub fn average_rating(&self, movie_id: MovieId) -> Option<f32> {
        let entry = self.reviews.get(&movie_id)?;
        let reviews = entry.value();
        if reviews.is_empty() {
            return None;
        }
        let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        Some(total as f32 / reviews.len() as f32)
    }

    /// Total number of reviews across all movies
    pub fn len(&self) -> usize {
        self.reviews.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
