use rayon::prelude::*;
use tracing::debug;

use super::vectorizer::FeatureVector;

/// Pairwise cosine similarities between all movies, stored row-major.
///
/// Movies whose vector is all zero score 0 against every movie, themselves
/// included.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Computes the upper triangle through an inverted term index, then
    /// mirrors it. Rows are processed in parallel.
    pub fn build(vectors: &[FeatureVector]) -> Self {
        let n = vectors.len();
        let dimension = vectors.iter().map(|v| v.dimension()).max().unwrap_or(0);

        let norms: Vec<f64> = vectors.iter().map(|v| v.norm()).collect();

        // Postings are appended in movie order, so each list is sorted.
        let mut postings: Vec<Vec<(u32, u32)>> = vec![Vec::new(); dimension];
        for (movie, vector) in vectors.iter().enumerate() {
            for &(term, count) in vector.entries() {
                postings[term as usize].push((movie as u32, count));
            }
        }

        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut dots = vec![0u64; n - i];
                for &(term, count) in vectors[i].entries() {
                    let list = &postings[term as usize];
                    let start = list.partition_point(|&(j, _)| (j as usize) < i);
                    for &(j, other) in &list[start..] {
                        dots[j as usize - i] += count as u64 * other as u64;
                    }
                }

                dots.iter()
                    .enumerate()
                    .map(|(offset, &dot)| {
                        let j = i + offset;
                        if offset == 0 {
                            if norms[i] > 0.0 {
                                1.0
                            } else {
                                0.0
                            }
                        } else {
                            cosine(dot, norms[i], norms[j])
                        }
                    })
                    .collect()
            })
            .collect();

        let mut values = vec![0f64; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, value) in row.into_iter().enumerate() {
                let j = i + offset;
                values[i * n + j] = value;
                values[j * n + i] = value;
            }
        }

        debug!("Computed {}x{} similarity matrix", n, n);
        Self { n, values }
    }

    /// Rebuilds a matrix from its row-major upper triangle (diagonal
    /// included). Returns `None` if the length does not fit `n`.
    pub fn from_packed_upper(n: usize, packed: &[f64]) -> Option<Self> {
        if packed.len() != n * (n + 1) / 2 {
            return None;
        }
        let mut values = vec![0f64; n * n];
        let mut cells = packed.iter();
        for i in 0..n {
            for j in i..n {
                let value = *cells.next()?;
                values[i * n + j] = value;
                values[j * n + i] = value;
            }
        }
        Some(Self { n, values })
    }

    pub fn packed_upper(&self) -> Vec<f64> {
        let mut packed = Vec::with_capacity(self.n * (self.n + 1) / 2);
        for i in 0..self.n {
            packed.extend_from_slice(&self.row(i)[i..]);
        }
        packed
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.n && j < self.n {
            Some(self.values[i * self.n + j])
        } else {
            None
        }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// Movies with an all-zero feature vector have a zero diagonal.
    pub fn zero_rows(&self) -> usize {
        (0..self.n).filter(|&i| self.values[i * self.n + i] == 0.0).count()
    }
}

fn cosine(dot: u64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    ((dot as f64) / (norm_a * norm_b)).clamp(0.0, 1.0)
}
