//! Content-based similarity engine.
//!
//! This crate turns a catalog of `MovieRecord`s into an immutable
//! `Snapshot` and answers queries against it.
//!
//! ## Architecture
//! The build runs once per catalog version:
//! 1. `features` composes one text document per movie
//! 2. `vectorizer` fits TF-IDF over all documents (unit-length vectors)
//! 3. `similarity` computes the dense N×N cosine matrix
//!
//! `ranker` then serves similar-to-title, trending and genre queries, and
//! `handle::RecommendationEngine` swaps whole snapshots for rebuilds.
//!
//! ## Example Usage
//! ```ignore
//! use engine::{BuildConfig, RecommendationEngine, DEFAULT_SIMILAR_COUNT};
//!
//! let engine = RecommendationEngine::build(catalog.into_movies(), BuildConfig::new())?;
//! for movie in engine.recommend_similar("Avatar", DEFAULT_SIMILAR_COUNT)? {
//!     println!("{}", movie.title);
//! }
//! ```

pub mod error;
pub mod features;
pub mod stopwords;
pub mod vectorizer;
pub mod similarity;
pub mod snapshot;
pub mod ranker;
pub mod handle;

// Re-export main types
pub use error::{EngineError, Result};
pub use handle::RecommendationEngine;
pub use features::{FeatureDocument, compose_document};
pub use ranker::{
    DEFAULT_GENRE_COUNT, DEFAULT_SIMILAR_COUNT, DEFAULT_TRENDING_COUNT, ScoredMovie,
    clamp_result_count,
};
pub use similarity::SimilarityMatrix;
pub use snapshot::{BuildConfig, Snapshot};
pub use stopwords::StopWords;
pub use vectorizer::{SparseVector, TfidfVectorizer, VectorSpace};
