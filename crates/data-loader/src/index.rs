//! Catalog building logic.
//!
//! Joins the movies and credits tables, decodes the structured columns,
//! applies the genre rule and the malformed-row policy, and indexes the
//! retained movies by id.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Ingestion settings
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub malformed_policy: MalformedPolicy,
    pub excluded_genres: Vec<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self {
            malformed_policy: MalformedPolicy::Abort,
            excluded_genres: vec![TV_MOVIE_GENRE.to_string()],
        }
    }

    /// Configure what happens to rows with undecodable fields (default: Abort)
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    /// Replace the excluded genre list (default: ["TV Movie"])
    pub fn with_excluded_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_genres = genres.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of normalising one joined row
enum RowOutcome {
    Retained(MovieRecord),
    Excluded,
}

impl Catalog {
    /// Load the catalog from the two TMDB CSV files
    ///
    /// Both tables are parsed in parallel, then joined on
    /// `movies.id == credits.movie_id`.
    #[instrument(skip_all, fields(movies = %movies_path.display(), credits = %credits_path.display()))]
    pub fn load_from_files(
        movies_path: &Path,
        credits_path: &Path,
        options: &LoadOptions,
    ) -> Result<Self> {
        let (movies, credits) = rayon::join(
            || parser::parse_movies(movies_path),
            || parser::parse_credits(credits_path),
        );
        let catalog = Self::from_rows(movies?, credits?, options)?;
        info!(
            "Catalog loaded: {} movies retained of {} rows",
            catalog.len(),
            catalog.report.movie_rows
        );
        Ok(catalog)
    }

    /// Same as `load_from_files` but from in-memory or streamed tables
    pub fn load_from_readers<M: Read + Send, C: Read + Send>(
        movies: M,
        credits: C,
        options: &LoadOptions,
    ) -> Result<Self> {
        let (movies, credits) = rayon::join(
            || parser::read_movies(movies),
            || parser::read_credits(credits),
        );
        Self::from_rows(movies?, credits?, options)
    }

    /// Join and normalise already parsed rows.
    ///
    /// Movies-table order is preserved. A movie without a credits row is
    /// dropped (inner join).
    pub fn from_rows(
        movies: Vec<MovieRow>,
        credits: Vec<CreditsRow>,
        options: &LoadOptions,
    ) -> Result<Self> {
        let mut credits_by_id: HashMap<MovieId, CreditsRow> = credits
            .into_iter()
            .map(|row| (row.movie_id, row))
            .collect();

        let mut catalog = Catalog::new();
        catalog.report.movie_rows = movies.len();
        // Every id in the movies table, retained or not
        let mut seen: HashSet<MovieId> = HashSet::with_capacity(movies.len());

        for row in movies {
            if !seen.insert(row.id) {
                catalog.reject(DataLoadError::DuplicateMovieId(row.id), options)?;
                continue;
            }
            let Some(credits) = credits_by_id.remove(&row.id) else {
                debug!("Movie {} has no credits row", row.id);
                catalog.report.unmatched += 1;
                continue;
            };

            match normalize_row(row, credits, &options.excluded_genres) {
                Ok(RowOutcome::Retained(record)) => catalog.insert(record),
                Ok(RowOutcome::Excluded) => catalog.report.excluded += 1,
                Err(err) => catalog.reject(err, options)?,
            }
        }

        Ok(catalog)
    }

    fn insert(&mut self, record: MovieRecord) {
        self.id_index.insert(record.id, self.movies.len());
        self.movies.push(record);
    }

    /// Apply the malformed-row policy to a row-level error
    fn reject(&mut self, err: DataLoadError, options: &LoadOptions) -> Result<()> {
        match (options.malformed_policy, err.movie_id()) {
            (MalformedPolicy::Skip, Some(movie_id)) => {
                warn!("Skipping movie {}: {}", movie_id, err);
                match err {
                    DataLoadError::DuplicateMovieId(_) => self.report.duplicates.push(movie_id),
                    _ => self.report.skipped.push(movie_id),
                }
                Ok(())
            }
            _ => Err(err),
        }
    }
}

/// Decode one joined row into a `MovieRecord`.
///
/// Genres are decoded and checked first so that an excluded movie is never
/// reported as malformed because of its other columns.
fn normalize_row(
    row: MovieRow,
    credits: CreditsRow,
    excluded_genres: &[String],
) -> Result<RowOutcome> {
    let id = row.id;
    let genres = parser::decode_names(&row.genres, "genres", id)?;
    if !genres_eligible(&genres, excluded_genres) {
        return Ok(RowOutcome::Excluded);
    }

    Ok(RowOutcome::Retained(MovieRecord {
        id,
        title: row.title,
        genres,
        cast: parser::decode_names(&credits.cast, "cast", id)?,
        directors: parser::decode_directors(&credits.crew, id)?,
        keywords: parser::decode_names(&row.keywords, "keywords", id)?,
        production_companies: parser::decode_names(
            &row.production_companies,
            "production_companies",
            id,
        )?,
        overview: row.overview.unwrap_or_default(),
        popularity: row.popularity.unwrap_or(0.0),
        vote_average: row.vote_average.unwrap_or(0.0),
        vote_count: row.vote_count.unwrap_or(0),
        release_date: row.release_date.filter(|d| !d.trim().is_empty()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIES: &str = "\
id,title,genres,keywords,production_companies,overview,popularity,vote_average,vote_count,release_date
1,Alpha,\"[{\"\"id\"\": 28, \"\"name\"\": \"\"Action\"\"}]\",\"[{\"\"id\"\": 1, \"\"name\"\": \"\"hero\"\"}]\",[],Alpha saves the day.,10.5,7.0,100,2010-01-01
2,Bravo,\"[{\"\"id\"\": 10770, \"\"name\"\": \"\"TV Movie\"\"}]\",not json,[],,1.0,5.0,3,
3,Charlie,[],[],[],,2.0,6.0,4,
4,Delta,\"[{\"\"id\"\": 18, \"\"name\"\": \"\"Drama\"\"}]\",[],[],Lonely drama.,3.0,6.5,20,1999-05-05
5,Echo,\"[{\"\"id\"\": 18, \"\"name\"\": \"\"Drama\"\"}]\",[],[],Unmatched.,3.0,6.5,20,1999-05-05
";

    const CREDITS: &str = "\
movie_id,title,cast,crew
1,Alpha,\"[{\"\"name\"\": \"\"Ann Actor\"\"}]\",\"[{\"\"name\"\": \"\"Dee Rector\"\", \"\"job\"\": \"\"Director\"\"}, {\"\"name\"\": \"\"Pro Ducer\"\", \"\"job\"\": \"\"Producer\"\"}]\"
2,Bravo,[],[]
3,Charlie,[],[]
4,Delta,{broken,[]
";

    #[test]
    fn test_join_filter_and_abort() {
        let err = Catalog::load_from_readers(MOVIES.as_bytes(), CREDITS.as_bytes(), &LoadOptions::new())
            .unwrap_err();
        // Delta has a malformed cast; Bravo's bad keywords never get decoded
        assert_eq!(err.movie_id(), Some(4));
    }

    #[test]
    fn test_skip_policy() {
        let options = LoadOptions::new().with_malformed_policy(MalformedPolicy::Skip);
        let catalog =
            Catalog::load_from_readers(MOVIES.as_bytes(), CREDITS.as_bytes(), &options).unwrap();

        assert_eq!(catalog.len(), 1);
        let alpha = catalog.get_movie(1).unwrap();
        assert_eq!(alpha.genres, vec!["Action"]);
        assert_eq!(alpha.cast, vec!["Ann Actor"]);
        assert_eq!(alpha.directors, vec!["Dee Rector"]);
        assert_eq!(alpha.keywords, vec!["hero"]);
        assert_eq!(alpha.release_year(), Some(2010));

        let report = catalog.report();
        assert_eq!(report.movie_rows, 5);
        assert_eq!(report.excluded, 2);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.skipped, vec![4]);
    }

    #[test]
    fn test_custom_exclusions() {
        let options = LoadOptions::new()
            .with_malformed_policy(MalformedPolicy::Skip)
            .with_excluded_genres(["Action"]);
        let catalog =
            Catalog::load_from_readers(MOVIES.as_bytes(), CREDITS.as_bytes(), &options).unwrap();
        // Alpha is now excluded; Bravo passes the genre rule but its keywords are not JSON
        assert!(catalog.is_empty());
        assert_eq!(catalog.report().skipped, vec![2, 4]);
    }

    #[test]
    fn test_duplicate_ids() {
        let movies = vec![
            MovieRow {
                id: 9,
                title: "First".to_string(),
                genres: r#"[{"name": "Drama"}]"#.to_string(),
                keywords: String::new(),
                production_companies: String::new(),
                overview: None,
                popularity: None,
                vote_average: None,
                vote_count: None,
                release_date: None,
            };
            2
        ];
        let credits = vec![CreditsRow {
            movie_id: 9,
            cast: "[]".to_string(),
            crew: "[]".to_string(),
        }];

        let err = Catalog::from_rows(movies.clone(), credits.clone(), &LoadOptions::new()).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateMovieId(9)));

        let options = LoadOptions::new().with_malformed_policy(MalformedPolicy::Skip);
        let catalog = Catalog::from_rows(movies, credits, &options).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.movies()[0].title, "First");
        assert_eq!(catalog.report().duplicates, vec![9]);
        assert!(catalog.report().skipped.is_empty());
    }

    #[test]
    fn test_duplicate_after_excluded_copy() {
        let tv_movie = MovieRow {
            id: 9,
            title: "Pilot".to_string(),
            genres: r#"[{"name": "TV Movie"}]"#.to_string(),
            keywords: String::new(),
            production_companies: String::new(),
            overview: None,
            popularity: None,
            vote_average: None,
            vote_count: None,
            release_date: None,
        };
        let feature = MovieRow {
            title: "Feature".to_string(),
            genres: r#"[{"name": "Drama"}]"#.to_string(),
            ..tv_movie.clone()
        };
        let movies = vec![tv_movie, feature];
        let credits = vec![CreditsRow {
            movie_id: 9,
            cast: "[]".to_string(),
            crew: "[]".to_string(),
        }];

        // The first copy is dropped by the genre rule, the repeat is still caught
        let err = Catalog::from_rows(movies.clone(), credits.clone(), &LoadOptions::new()).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateMovieId(9)));

        let options = LoadOptions::new().with_malformed_policy(MalformedPolicy::Skip);
        let catalog = Catalog::from_rows(movies, credits, &options).unwrap();
        assert!(catalog.is_empty());
        let report = catalog.report();
        assert_eq!(report.excluded, 1);
        assert_eq!(report.unmatched, 0);
        assert_eq!(report.duplicates, vec![9]);
    }
}
