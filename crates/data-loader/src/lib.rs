//! # Data Loader Crate
//!
//! This crate turns the two TMDB 5000 tables (movies and credits) into an
//! ordered catalog of normalised `MovieRecord`s.
//!
//! ## Main Components
//!
//! - **types**: Raw CSV rows, `MovieRecord`, `Catalog`, load policy types
//! - **parser**: CSV readers and JSON decoding of the list columns
//! - **index**: Join, genre filtering, malformed-row policy
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Catalog, LoadOptions, MalformedPolicy};
//! use std::path::Path;
//!
//! let options = LoadOptions::new().with_malformed_policy(MalformedPolicy::Skip);
//! let catalog = Catalog::load_from_files(
//!     Path::new("data/tmdb_5000_movies.csv"),
//!     Path::new("data/tmdb_5000_credits.csv"),
//!     &options,
//! )?;
//!
//! println!("{} movies, {} skipped", catalog.len(), catalog.report().skipped.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::LoadOptions;
pub use types::{
    // Type aliases and constants
    MovieId,
    TV_MOVIE_GENRE,
    // Core types
    Catalog,
    LoadReport,
    MalformedPolicy,
    MovieRecord,
    genres_eligible,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.report(), &LoadReport::default());
    }

    #[test]
    fn test_empty_queries() {
        let catalog = Catalog::new();
        assert!(catalog.get_movie(999).is_none());
        assert!(catalog.movies().is_empty());
    }

    #[test]
    fn test_default_options() {
        let options = LoadOptions::default();
        assert_eq!(options.malformed_policy, MalformedPolicy::Abort);
        assert_eq!(options.excluded_genres, vec![TV_MOVIE_GENRE.to_string()]);
    }
}
