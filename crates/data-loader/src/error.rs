//! Error types for the data-loader crate.
//!
//! Every failure carries enough context to find the offending row: the
//! file for I/O and CSV problems, the movie id for field-level problems.

use crate::types::MovieId;
use thiserror::Error;

/// Errors that can occur while loading and normalising the catalog
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV layer rejected a record (bad quoting, wrong column type, ...)
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A JSON-encoded list column could not be decoded
    ///
    /// Raised per movie so the caller can decide between aborting the
    /// build and skipping the row (see `MalformedPolicy`).
    #[error("Malformed {field} for movie {movie_id}: {reason}")]
    MalformedFeatureField {
        movie_id: MovieId,
        field: &'static str,
        reason: String,
    },

    /// The movies table listed the same id twice
    #[error("Duplicate movie id {0}")]
    DuplicateMovieId(MovieId),
}

impl DataLoadError {
    /// Movie the error is attributed to, if it concerns a single row
    pub fn movie_id(&self) -> Option<MovieId> {
        match self {
            DataLoadError::MalformedFeatureField { movie_id, .. } => Some(*movie_id),
            DataLoadError::DuplicateMovieId(id) => Some(*id),
            _ => None,
        }
    }

    /// Row-level errors are the ones a `Skip` policy may swallow
    pub fn is_row_level(&self) -> bool {
        self.movie_id().is_some()
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
