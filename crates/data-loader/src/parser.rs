//! Parsers for the TMDB 5000 data files.
//!
//! - tmdb_5000_movies.csv: id, title, genres, keywords, production_companies, overview, ...
//! - tmdb_5000_credits.csv: movie_id, title, cast, crew
//!
//! The list columns are JSON arrays embedded in a CSV cell, e.g.
//! `[{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}]`.
//! They are decoded per movie so a bad cell can be attributed to its row.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

/// Deserialize every record of a headed CSV stream into `T`
fn read_rows<T, R>(reader: R, file: &str) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    csv_reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|source| DataLoadError::Csv {
            file: file.to_string(),
            source,
        })
}

/// Parse the movies table from any reader
pub fn read_movies<R: Read>(reader: R) -> Result<Vec<MovieRow>> {
    read_rows(reader, "movies")
}

/// Parse the credits table from any reader
pub fn read_credits<R: Read>(reader: R) -> Result<Vec<CreditsRow>> {
    read_rows(reader, "credits")
}

/// Parse tmdb_5000_movies.csv
pub fn parse_movies(path: &Path) -> Result<Vec<MovieRow>> {
    read_rows(open(path)?, &path.display().to_string())
}

/// Parse tmdb_5000_credits.csv
pub fn parse_credits(path: &Path) -> Result<Vec<CreditsRow>> {
    read_rows(open(path)?, &path.display().to_string())
}

/// Decode a JSON list column into the `name` of each element.
///
/// Example: `[{"id": 28, "name": "Action"}]` -> `vec!["Action"]`
///
/// An empty cell is an absent list and decodes to an empty Vec.
pub fn decode_names(raw: &str, field: &'static str, movie_id: MovieId) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<NamedEntry> =
        serde_json::from_str(raw).map_err(|e| DataLoadError::MalformedFeatureField {
            movie_id,
            field,
            reason: e.to_string(),
        })?;
    Ok(entries.into_iter().map(|entry| entry.name).collect())
}

/// Decode the crew column and keep only the directors, in crew order
pub fn decode_directors(raw: &str, movie_id: MovieId) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let crew: Vec<CrewMember> =
        serde_json::from_str(raw).map_err(|e| DataLoadError::MalformedFeatureField {
            movie_id,
            field: "crew",
            reason: e.to_string(),
        })?;
    Ok(crew
        .into_iter()
        .filter(|member| member.job == "Director")
        .map(|member| member.name)
        .collect())
}
