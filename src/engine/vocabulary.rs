use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::engine::EngineError;
use super::stopwords::StopWords;
use super::tokenizer::Tokenizer;

/// Ordered feature terms. Position in the sequence is the vector dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { terms, index }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

impl Vocabulary {
    /// Selects up to `max_features` terms by total occurrence count across
    /// all tag strings. Equal counts keep the order in which the terms were
    /// first seen. Stop words never enter the vocabulary.
    pub fn build<'a, I>(
        tags: I,
        stop_words: &StopWords,
        max_features: usize,
        tokenizer: Tokenizer,
    ) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, u64)> = Vec::new();
        let mut documents = 0usize;

        for tag_string in tags {
            documents += 1;
            tokenizer.for_each_token(tag_string, |token| {
                if stop_words.contains(token) {
                    return;
                }
                match slots.get(token) {
                    Some(&slot) => counts[slot].1 += 1,
                    None => {
                        slots.insert(token.to_string(), counts.len());
                        counts.push((token.to_string(), 1));
                    }
                }
            });
        }

        if documents == 0 {
            return Err(EngineError::EmptyCorpus);
        }

        let distinct = counts.len();
        // Stable sort: ties stay in first-seen order.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(max_features);

        debug!(
            "Built vocabulary of {} terms ({} distinct, max {})",
            counts.len(),
            distinct,
            max_features
        );

        Ok(Self::from(
            counts.into_iter().map(|(term, _)| term).collect::<Vec<_>>(),
        ))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn position(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }
}
