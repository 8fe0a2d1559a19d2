use std::time::Instant;
use tracing::{info, warn};

use super::artifact::{ArtifactCache, ArtifactError};
use super::corpus::{Corpus, Movie};
use super::fuzzy;
use super::recommend::{recommend, Recommendation};
use super::similarity::SimilarityMatrix;
use super::stats::CorpusStats;
use super::stopwords::StopWords;
use super::tokenizer::Tokenizer;
use super::vectorizer::Vectorizer;
use super::vocabulary::Vocabulary;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_features: usize,
    pub stop_words: StopWords,
    pub tokenizer: Tokenizer,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_features: 5000,
            stop_words: StopWords::english(),
            tokenizer: Tokenizer::Whitespace,
        }
    }
}

/// Where the similarity model of an [`Engine`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSource {
    Cache,
    Fresh,
}

/// Corpus plus its vocabulary and similarity matrix. Immutable once built,
/// so it can be shared between threads without locking.
#[derive(Debug, Clone)]
pub struct Engine {
    corpus: Corpus,
    vocabulary: Vocabulary,
    matrix: SimilarityMatrix,
}

impl Engine {
    pub fn build(
        corpus: Corpus,
        stop_words: &StopWords,
        max_features: usize,
    ) -> Result<Self, EngineError> {
        let settings = EngineSettings {
            max_features,
            stop_words: stop_words.clone(),
            tokenizer: Tokenizer::Whitespace,
        };
        Self::build_with(corpus, &settings)
    }

    pub fn build_with(corpus: Corpus, settings: &EngineSettings) -> Result<Self, EngineError> {
        if corpus.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }

        let started = Instant::now();
        let vocabulary = Vocabulary::build(
            corpus.tags(),
            &settings.stop_words,
            settings.max_features,
            settings.tokenizer,
        )?;

        let tags: Vec<&str> = corpus.tags().collect();
        let vectors = Vectorizer::new(&vocabulary, settings.tokenizer).transform_all(&tags);
        let matrix = SimilarityMatrix::build(&vectors);

        let zero = matrix.zero_rows();
        if zero > 0 {
            warn!("{} movies have no vocabulary terms and will never be recommended", zero);
        }

        info!(
            "Built similarity model for {} movies over {} terms in {:?}",
            corpus.len(),
            vocabulary.len(),
            started.elapsed()
        );

        Ok(Self {
            corpus,
            vocabulary,
            matrix,
        })
    }

    pub fn from_parts(
        corpus: Corpus,
        vocabulary: Vocabulary,
        matrix: SimilarityMatrix,
    ) -> Result<Self, EngineError> {
        if corpus.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        if matrix.len() != corpus.len() {
            return Err(EngineError::Artifact(ArtifactError::Incompatible {
                expected: corpus.len(),
                found: matrix.len(),
            }));
        }
        Ok(Self {
            corpus,
            vocabulary,
            matrix,
        })
    }

    /// Uses the cached model when one fits the corpus, otherwise builds and
    /// stores a fresh one. Cache problems are logged, never returned.
    pub fn load_or_build(
        corpus: Corpus,
        settings: &EngineSettings,
        cache: Option<&ArtifactCache>,
        force_rebuild: bool,
    ) -> Result<(Self, BuildSource), EngineError> {
        if corpus.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }

        let Some(cache) = cache else {
            return Ok((Self::build_with(corpus, settings)?, BuildSource::Fresh));
        };

        if !force_rebuild {
            match cache.load(corpus.len()) {
                Ok(Some(model)) => {
                    info!("Using cached model built {}", model.created);
                    let engine = Self::from_parts(corpus, model.vocabulary, model.matrix)?;
                    return Ok((engine, BuildSource::Cache));
                }
                Ok(None) => info!("No cached model, building from corpus"),
                Err(e) => warn!("Ignoring cached model: {}", e),
            }
        }

        let engine = Self::build_with(corpus, settings)?;
        if let Err(e) = cache.store(&engine.vocabulary, &engine.matrix) {
            warn!("Failed to store model at {}: {}", cache.path().display(), e);
        }
        Ok((engine, BuildSource::Fresh))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn movie(&self, index: usize) -> Option<&Movie> {
        self.corpus.get(index)
    }

    pub fn recommend(
        &self,
        movie_index: usize,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, EngineError> {
        recommend(&self.matrix, movie_index, top_k)
    }

    pub fn recommend_by_id(
        &self,
        movie_id: i64,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let index = self
            .corpus
            .index_of_id(movie_id)
            .ok_or(EngineError::UnknownMovieId(movie_id))?;
        self.recommend(index, top_k)
    }

    /// Corpus index of the title closest to `query`.
    pub fn resolve(&self, query: &str, cutoff: f64) -> Option<usize> {
        fuzzy::resolve(query, &self.corpus.titles(), cutoff)
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats::collect(&self.corpus, &self.vocabulary, &self.matrix)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Corpus is empty")]
    EmptyCorpus,
    #[error("Unknown movie index {index} (corpus has {len} movies)")]
    UnknownMovie { index: usize, len: usize },
    #[error("Unknown movie id {0}")]
    UnknownMovieId(i64),
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}
