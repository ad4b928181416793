//! TF-IDF vectorization of feature documents.
//!
//! ## Weighting
//! ```text
//! tfidf(t, d) = tf(t, d) × idf(t)
//! tf(t, d)    = raw count of t in d
//! idf(t)      = ln((1 + n) / (1 + df(t))) + 1
//! ```
//! The `+ 1` terms smooth the idf so a term present in every document
//! keeps a weight of exactly 1 instead of 0. Every document vector is
//! then scaled to unit length, so the dot product of two vectors is
//! their cosine similarity.
//!
//! ## Determinism
//! Vocabulary columns are assigned in lexicographic term order and each
//! document is vectorized independently, so the same corpus always yields
//! the same `VectorSpace`, whatever the thread count.

use crate::stopwords::StopWords;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, instrument, warn};

/// Sparse unit-length document vector.
///
/// Entries are `(column, weight)` pairs sorted by column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product by merging the two sorted entry lists.
    ///
    /// Accumulates in f64; the pairs are visited in column order no matter
    /// which side is `self`, so `a.dot(b) == b.dot(a)` bit for bit.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f64;
        while i < self.entries.len() && j < other.entries.len() {
            let (col_a, val_a) = self.entries[i];
            let (col_b, val_b) = other.entries[j];
            match col_a.cmp(&col_b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += val_a as f64 * val_b as f64;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|&(_, v)| v as f64 * v as f64)
            .sum::<f64>()
            .sqrt()
    }
}

/// Fitted vocabulary plus one vector per document, aligned by position
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSpace {
    /// term → column
    vocabulary: HashMap<String, usize>,
    /// column → term, lexicographically sorted
    terms: Vec<String>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl VectorSpace {
    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn term(&self, column: usize) -> Option<&str> {
        self.terms.get(column).map(String::as_str)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.column(term).map(|col| self.idf[col])
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub fn vector(&self, row: usize) -> Option<&SparseVector> {
        self.vectors.get(row)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Fits a `VectorSpace` over a corpus in one pass
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    stop_words: StopWords,
    min_token_len: usize,
}

impl TfidfVectorizer {
    /// English stop words, tokens of two or more characters
    pub fn new() -> Self {
        Self {
            stop_words: StopWords::english(),
            min_token_len: 2,
        }
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    /// Shortest token kept, in characters (default: 2)
    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len.max(1);
        self
    }

    /// Lowercase `text`, split it into runs of alphanumeric/underscore
    /// characters and drop short tokens and stop words.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= self.min_token_len)
            .filter(|token| !self.stop_words.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Learn the vocabulary and idf weights and vectorize every document.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn fit<S: AsRef<str> + Sync>(&self, documents: &[S]) -> VectorSpace {
        let tokenized: Vec<Vec<String>> = documents
            .par_iter()
            .map(|doc| self.tokenize(doc.as_ref()))
            .collect();

        // Document frequency, counted once per document
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let terms: Vec<String> = doc_freq.keys().map(|t| t.to_string()).collect();
        let idf: Vec<f64> = doc_freq
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(col, term)| (term.clone(), col))
            .collect();

        if vocabulary.is_empty() {
            warn!("Vocabulary is empty; every document vector will be zero");
        }
        debug!("Vocabulary size: {}", vocabulary.len());

        let vectors: Vec<SparseVector> = tokenized
            .par_iter()
            .map(|tokens| weigh(tokens, &vocabulary, &idf))
            .collect();

        VectorSpace {
            vocabulary,
            terms,
            idf,
            vectors,
        }
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the unit-length tf-idf vector of one tokenized document
fn weigh(tokens: &[String], vocabulary: &HashMap<String, usize>, idf: &[f64]) -> SparseVector {
    let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
    for token in tokens {
        if let Some(&col) = vocabulary.get(token) {
            *counts.entry(col).or_insert(0) += 1;
        }
    }

    let weighted: Vec<(usize, f64)> = counts
        .into_iter()
        .map(|(col, tf)| (col, tf as f64 * idf[col]))
        .collect();

    let norm = weighted.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return SparseVector::default();
    }

    SparseVector {
        entries: weighted
            .into_iter()
            .map(|(col, w)| (col, (w / norm) as f32))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let vectorizer = TfidfVectorizer::new();
        let tokens = vectorizer.tokenize("In the 22nd century, a paraplegic Marine is dispatched!");
        assert_eq!(tokens, vec!["22nd", "century", "paraplegic", "marine", "dispatched"]);
    }

    #[test]
    fn test_tokenize_keeps_underscores_and_drops_single_chars() {
        let vectorizer = TfidfVectorizer::new().with_stop_words(StopWords::none());
        assert_eq!(vectorizer.tokenize("x snake_case Y z9"), vec!["snake_case", "z9"]);
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let space = TfidfVectorizer::new().fit(&["zebra apple", "mango apple"]);
        assert_eq!(space.vocabulary_size(), 3);
        assert_eq!(space.term(0), Some("apple"));
        assert_eq!(space.term(1), Some("mango"));
        assert_eq!(space.term(2), Some("zebra"));
        assert_eq!(space.column("zebra"), Some(2));
    }

    #[test]
    fn test_smoothed_idf() {
        let space = TfidfVectorizer::new().fit(&["zebra apple", "mango apple"]);
        // Present everywhere: ln(3/3) + 1
        assert!((space.idf("apple").unwrap() - 1.0).abs() < 1e-12);
        // Present once: ln(3/2) + 1
        assert!((space.idf("zebra").unwrap() - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let space = TfidfVectorizer::new().fit(&[
            "action hero fight fight",
            "romance drama love",
            "the and of", // only stop words
        ]);
        assert!((space.vector(0).unwrap().norm() - 1.0).abs() < 1e-6);
        assert!((space.vector(1).unwrap().norm() - 1.0).abs() < 1e-6);
        assert!(space.vector(2).unwrap().is_zero());
    }

    #[test]
    fn test_term_frequency_raises_weight() {
        let space = TfidfVectorizer::new().fit(&["hero fight fight", "calm"]);
        let vector = space.vector(0).unwrap();
        let hero = space.column("hero").unwrap();
        let fight = space.column("fight").unwrap();
        let weight = |col: usize| {
            vector
                .entries()
                .iter()
                .find(|(c, _)| *c == col)
                .map(|&(_, w)| w)
                .unwrap()
        };
        assert!((weight(fight) / weight(hero) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_dot_is_cosine() {
        let space = TfidfVectorizer::new().fit(&[
            "action hero fight",
            "action villain fight",
            "romance drama love",
        ]);
        let v = space.vectors();
        assert!((v[0].dot(&v[0]) - 1.0).abs() < 1e-6);
        assert!(v[0].dot(&v[1]) > v[0].dot(&v[2]));
        assert_eq!(v[0].dot(&v[2]), 0.0);
        assert_eq!(v[0].dot(&v[1]), v[1].dot(&v[0]));
    }

    #[test]
    fn test_empty_corpus_vocabulary() {
        let documents: [&str; 0] = [];
        let space = TfidfVectorizer::new().fit(&documents);
        assert!(space.is_empty());
        assert_eq!(space.vocabulary_size(), 0);
    }
}
