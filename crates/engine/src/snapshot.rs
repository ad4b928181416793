//! Immutable build of records, documents, vectors and similarity matrix.
//!
//! Row `i` means the same movie in every structure of a snapshot. A
//! snapshot is never modified after `Snapshot::build` returns; catalog
//! changes produce a new one (see `RecommendationEngine::rebuild`).

use crate::error::{EngineError, Result};
use crate::features::{self, FeatureDocument};
use crate::similarity::SimilarityMatrix;
use crate::stopwords::StopWords;
use crate::vectorizer::{TfidfVectorizer, VectorSpace};
use data_loader::{MovieId, MovieRecord, TV_MOVIE_GENRE};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Settings for one snapshot build
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub excluded_genres: Vec<String>,
    pub stop_words: StopWords,
    pub min_token_len: usize,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self {
            excluded_genres: vec![TV_MOVIE_GENRE.to_string()],
            stop_words: StopWords::english(),
            min_token_len: 2,
        }
    }

    pub fn with_excluded_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }

    fn vectorizer(&self) -> TfidfVectorizer {
        TfidfVectorizer::new()
            .with_stop_words(self.stop_words.clone())
            .with_min_token_len(self.min_token_len)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) records: Vec<MovieRecord>,
    pub(crate) documents: Vec<FeatureDocument>,
    pub(crate) space: VectorSpace,
    pub(crate) matrix: SimilarityMatrix,
    pub(crate) id_index: HashMap<MovieId, usize>,
    /// First row carrying each title
    pub(crate) title_index: HashMap<String, usize>,
}

impl Snapshot {
    /// Filter, compose, vectorize and compute similarities.
    ///
    /// Records failing the genre rule are dropped first (ingestion already
    /// does this, but programmatic catalogs go through here too).
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn build(records: Vec<MovieRecord>, config: &BuildConfig) -> Result<Self> {
        let start = Instant::now();
        let total = records.len();

        let records: Vec<MovieRecord> = records
            .into_iter()
            .filter(|movie| movie.is_eligible(&config.excluded_genres))
            .collect();
        if records.len() < total {
            warn!(
                "Dropped {} movies with no genre or an excluded genre",
                total - records.len()
            );
        }
        if records.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }

        let mut id_index = HashMap::with_capacity(records.len());
        let mut title_index = HashMap::with_capacity(records.len());
        for (row, movie) in records.iter().enumerate() {
            if id_index.insert(movie.id, row).is_some() {
                return Err(EngineError::DuplicateMovieId(movie.id));
            }
            title_index.entry(movie.title.clone()).or_insert(row);
        }

        let documents = features::compose_documents(&records);
        let space = config.vectorizer().fit(&documents);
        let matrix = SimilarityMatrix::build(&space);

        info!(
            "Snapshot built: {} movies, {} terms in {:.2?}",
            records.len(),
            space.vocabulary_size(),
            start.elapsed()
        );

        Ok(Self {
            records,
            documents,
            space,
            matrix,
            id_index,
            title_index,
        })
    }

    /// Number of movies (N)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    pub fn documents(&self) -> &[FeatureDocument] {
        &self.documents
    }

    pub fn vector_space(&self) -> &VectorSpace {
        &self.space
    }

    pub fn similarity_matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn get(&self, id: MovieId) -> Option<&MovieRecord> {
        self.row_of_id(id).map(|row| &self.records[row])
    }

    pub fn find_by_title(&self, title: &str) -> Option<&MovieRecord> {
        self.row_of_title(title).map(|row| &self.records[row])
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Similarity of two movies by id
    pub fn similarity(&self, a: MovieId, b: MovieId) -> Option<f32> {
        self.matrix.get(self.row_of_id(a)?, self.row_of_id(b)?)
    }

    /// Distinct titles in catalog order (selection list)
    pub fn titles(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|movie| movie.title.as_str())
            .filter(|title| seen.insert(*title))
            .collect()
    }

    /// Distinct genres in order of first appearance (selection list)
    pub fn genres(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .flat_map(|movie| movie.genres.iter().map(String::as_str))
            .filter(|genre| seen.insert(*genre))
            .collect()
    }

    pub(crate) fn row_of_id(&self, id: MovieId) -> Option<usize> {
        self.id_index.get(&id).copied()
    }

    pub(crate) fn row_of_title(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }
}
