//! Core domain types for the TMDB catalog.
//!
//! Two groups live here:
//! - the raw rows as they come out of the two CSV tables
//! - the normalised `MovieRecord` and the `Catalog` that owns them

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a movie (TMDB id)
pub type MovieId = u32;

/// Genre that is dropped from the catalog unless configured otherwise
pub const TV_MOVIE_GENRE: &str = "TV Movie";

// =============================================================================
// Raw Rows
// =============================================================================

/// One row of `tmdb_5000_movies.csv`.
///
/// Only the columns the engine needs are declared; the CSV reader matches
/// them by header name and ignores the rest (budget, homepage, ...).
/// The list columns stay JSON strings until `parser::decode_*` runs.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieRow {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub genres: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub production_companies: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// One row of `tmdb_5000_credits.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsRow {
    pub movie_id: MovieId,
    #[serde(default)]
    pub cast: String,
    #[serde(default)]
    pub crew: String,
}

/// Element of a JSON list column: `{"id": 28, "name": "Action"}`
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

/// Element of the crew column; only `name` and `job` are used
#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

// =============================================================================
// MovieRecord
// =============================================================================

/// A normalised catalog entry.
///
/// All list fields keep the order of the source JSON so the composed
/// feature document is reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub directors: Vec<String>,
    pub keywords: Vec<String>,
    pub production_companies: Vec<String>,
    /// Empty when the source cell was absent
    pub overview: String,
    pub popularity: f64,
    pub vote_average: f32,
    pub vote_count: u32,
    pub release_date: Option<String>,
}

impl MovieRecord {
    /// Minimal record, handy for fixtures and programmatic catalogs
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            genres: Vec::new(),
            cast: Vec::new(),
            directors: Vec::new(),
            keywords: Vec::new(),
            production_companies: Vec::new(),
            overview: String::new(),
            popularity: 0.0,
            vote_average: 0.0,
            vote_count: 0,
            release_date: None,
        }
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    /// Year taken from a `YYYY-MM-DD` release date
    ///
    /// Example: "2009-12-10" -> Some(2009)
    pub fn release_year(&self) -> Option<u16> {
        let date = self.release_date.as_deref()?;
        date.get(..4)?.parse().ok()
    }

    /// A movie is a similarity candidate only if it has at least one genre
    /// and none of them is excluded.
    pub fn is_eligible<S: AsRef<str>>(&self, excluded_genres: &[S]) -> bool {
        genres_eligible(&self.genres, excluded_genres)
    }
}

/// Genre rule shared by ingestion and snapshot building
pub fn genres_eligible<S: AsRef<str>>(genres: &[String], excluded_genres: &[S]) -> bool {
    !genres.is_empty()
        && !excluded_genres
            .iter()
            .any(|excluded| genres.iter().any(|g| g == excluded.as_ref()))
}

// =============================================================================
// Catalog
// =============================================================================

/// How row-level decoding failures are handled during ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// First malformed row fails the whole load
    #[default]
    Abort,
    /// Malformed rows are logged and left out of the catalog
    Skip,
}

/// Counters collected while building a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows present in the movies table
    pub movie_rows: usize,
    /// Movies without a matching credits row
    pub unmatched: usize,
    /// Movies removed by the genre rule (empty or excluded genre)
    pub excluded: usize,
    /// Movies dropped under `MalformedPolicy::Skip`
    pub skipped: Vec<MovieId>,
    /// Repeated movie ids dropped under `MalformedPolicy::Skip`; the first
    /// copy keeps its own outcome
    pub duplicates: Vec<MovieId>,
}

/// The ordered set of retained movies.
///
/// Row order is the order of the movies table and never changes once
/// built; everything downstream (documents, vectors, matrix rows) is
/// aligned to it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) movies: Vec<MovieRecord>,
    pub(crate) id_index: HashMap<MovieId, usize>,
    pub(crate) report: LoadReport,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&MovieRecord> {
        self.id_index.get(&id).map(|&row| &self.movies[row])
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Hand the records over to the engine
    pub fn into_movies(self) -> Vec<MovieRecord> {
        self.movies
    }
}
