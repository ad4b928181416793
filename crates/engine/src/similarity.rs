//! Dense pairwise cosine similarity over the whole catalog.
//!
//! Vectors are unit length, so similarity(i, j) is a plain dot product.
//! Memory is N² f32 values, which is fine for catalogs in the thousands;
//! anything much larger would need an approximate nearest-neighbour index.

use crate::vectorizer::VectorSpace;
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Row-major N×N similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute every row in parallel.
    ///
    /// The diagonal is pinned to the row maximum so self-similarity is
    /// never beaten by float rounding on a near-duplicate document.
    #[instrument(skip_all, fields(rows = space.len()))]
    pub fn build(space: &VectorSpace) -> Self {
        let n = space.len();
        let vectors = space.vectors();
        let mut values = vec![0.0f32; n * n];

        if n > 0 {
            values.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
                let query = &vectors[i];
                for (j, cell) in row.iter_mut().enumerate() {
                    *cell = query.dot(&vectors[j]) as f32;
                }
                row[i] = row.iter().copied().fold(row[i], f32::max);
            });
        }

        debug!("Similarity matrix built: {n}x{n}");
        Self { n, values }
    }

    /// Number of rows (= columns)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.n && j < self.n {
            Some(self.values[i * self.n + j])
        } else {
            None
        }
    }
}
