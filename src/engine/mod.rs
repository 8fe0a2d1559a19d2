pub mod artifact;
pub mod corpus;
pub mod engine;
pub mod fuzzy;
pub mod recommend;
pub mod similarity;
pub mod stats;
pub mod stopwords;
pub mod tokenizer;
pub mod vectorizer;
pub mod vocabulary;

pub use artifact::{ArtifactCache, ArtifactError, CachedModel};
pub use corpus::{Corpus, CorpusError, Movie};
pub use engine::{BuildSource, Engine, EngineError, EngineSettings};
pub use fuzzy::{resolve, DEFAULT_CUTOFF};
pub use recommend::Recommendation;
pub use similarity::SimilarityMatrix;
pub use stats::{CorpusStats, TagCount, YearCount};
pub use stopwords::StopWords;
pub use tokenizer::Tokenizer;
pub use vectorizer::{FeatureVector, Vectorizer};
pub use vocabulary::Vocabulary;
