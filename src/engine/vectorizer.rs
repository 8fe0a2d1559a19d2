use rayon::prelude::*;
use std::collections::BTreeMap;

use super::tokenizer::Tokenizer;
use super::vocabulary::Vocabulary;

/// Term counts for one movie over a fixed vocabulary.
///
/// Logically dense with `dimension` entries; only the non-zero entries are
/// stored, ordered by term position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(u32, u32)>,
}

impl FeatureVector {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[cfg(test)]
    pub fn get(&self, term: usize) -> u32 {
        self.entries
            .binary_search_by_key(&(term as u32), |&(t, _)| t)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> &[(u32, u32)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|&(_, c)| (c as f64) * (c as f64))
            .sum::<f64>()
            .sqrt()
    }

    pub fn dot(&self, other: &FeatureVector) -> u64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0u64;
        while i < self.entries.len() && j < other.entries.len() {
            let (ta, ca) = self.entries[i];
            let (tb, cb) = other.entries[j];
            if ta == tb {
                sum += ca as u64 * cb as u64;
                i += 1;
                j += 1;
            } else if ta < tb {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum
    }

    #[cfg(test)]
    pub fn to_dense(&self) -> Vec<u32> {
        let mut dense = vec![0; self.dimension];
        for &(t, c) in &self.entries {
            dense[t as usize] = c;
        }
        dense
    }
}

/// Turns tag strings into count vectors over a vocabulary. Terms outside
/// the vocabulary are ignored.
pub struct Vectorizer<'a> {
    vocabulary: &'a Vocabulary,
    tokenizer: Tokenizer,
}

impl<'a> Vectorizer<'a> {
    pub fn new(vocabulary: &'a Vocabulary, tokenizer: Tokenizer) -> Self {
        Self {
            vocabulary,
            tokenizer,
        }
    }

    pub fn transform(&self, tags: &str) -> FeatureVector {
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        self.tokenizer.for_each_token(tags, |token| {
            if let Some(pos) = self.vocabulary.position(token) {
                *counts.entry(pos as u32).or_insert(0) += 1;
            }
        });

        FeatureVector {
            dimension: self.vocabulary.len(),
            entries: counts.into_iter().collect(),
        }
    }

    pub fn transform_all(&self, tags: &[&str]) -> Vec<FeatureVector> {
        tags.par_iter().map(|t| self.transform(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stopwords::StopWords;

    fn vocabulary() -> Vocabulary {
        Vocabulary::build(
            ["space alien war", "alien invasion war", "romance drama"],
            &StopWords::none(),
            10,
            Tokenizer::Whitespace,
        )
        .unwrap()
    }

    #[test]
    fn test_counts_over_vocabulary() {
        let vocab = vocabulary();
        let vectorizer = Vectorizer::new(&vocab, Tokenizer::Whitespace);

        let v = vectorizer.transform("war war alien martian");
        assert_eq!(v.dimension(), 6);
        // alien, war, space, invasion, romance, drama
        assert_eq!(v.to_dense(), vec![1, 2, 0, 0, 0, 0]);
        assert_eq!(v.get(1), 2);
        assert_eq!(v.get(5), 0);
    }

    #[test]
    fn test_unknown_terms_give_zero_vector() {
        let vocab = vocabulary();
        let vectorizer = Vectorizer::new(&vocab, Tokenizer::Whitespace);

        let v = vectorizer.transform("martian cowboy");
        assert!(v.is_zero());
        assert_eq!(v.norm(), 0.0);
        assert_eq!(v.to_dense().len(), vocab.len());
    }

    #[test]
    fn test_dot_and_norm() {
        let vocab = vocabulary();
        let vectorizer = Vectorizer::new(&vocab, Tokenizer::Whitespace);
        let vs =
            vectorizer.transform_all(&["space alien war", "alien invasion war", "romance drama"]);

        assert_eq!(vs[0].dot(&vs[1]), 2);
        assert_eq!(vs[0].dot(&vs[2]), 0);
        assert!((vs[0].norm() - 3f64.sqrt()).abs() < 1e-12);
    }
}
