//! Error types for the engine crate.

use data_loader::MovieId;
use thiserror::Error;

/// Build-time and query-time failures of the recommendation engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Nothing survived filtering, so there is nothing to vectorize
    #[error("Cannot build a snapshot from an empty catalog")]
    EmptyCorpus,

    /// Two records passed to a build share an id
    #[error("Duplicate movie id {0} in catalog")]
    DuplicateMovieId(MovieId),

    /// The queried title or id is not part of the snapshot
    #[error("Movie not found: {query}")]
    NotFound { query: String },

    /// The query itself is unusable (e.g. a blank title)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
