use serde::Serialize;
use std::cmp::Ordering;

use super::engine::EngineError;
use super::similarity::SimilarityMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub index: usize,
    pub score: f64,
}

/// Higher score first, lower corpus index on equal scores.
fn rank(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}

/// Returns the `top_k` movies most similar to `movie_index`, excluding the
/// movie itself.
pub fn recommend(
    matrix: &SimilarityMatrix,
    movie_index: usize,
    top_k: usize,
) -> Result<Vec<Recommendation>, EngineError> {
    if movie_index >= matrix.len() {
        return Err(EngineError::UnknownMovie {
            index: movie_index,
            len: matrix.len(),
        });
    }

    let mut candidates: Vec<Recommendation> = matrix
        .row(movie_index)
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != movie_index)
        .map(|(index, &score)| Recommendation { index, score })
        .collect();

    let k = top_k.min(candidates.len());
    if k == 0 {
        return Ok(Vec::new());
    }
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, rank);
        candidates.truncate(k);
    }
    candidates.sort_by(rank);

    Ok(candidates)
}
