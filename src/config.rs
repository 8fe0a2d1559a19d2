use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::{EngineSettings, StopWords, Tokenizer};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub artifact: Option<ArtifactConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(skip)]
    pub debug_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactConfig {
    pub path: PathBuf,
}

/// Either a named list (`english`, `none`) or explicit words.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StopWordsConfig {
    Named(String),
    List(Vec<String>),
}

impl Default for StopWordsConfig {
    fn default() -> Self {
        StopWordsConfig::Named("english".to_string())
    }
}

impl StopWordsConfig {
    pub fn to_stop_words(&self) -> Result<StopWords, ConfigError> {
        match self {
            StopWordsConfig::Named(name) => match name.to_lowercase().as_str() {
                "english" => Ok(StopWords::english()),
                "none" | "" => Ok(StopWords::none()),
                other => Err(ConfigError::Invalid(format!(
                    "unknown stop word list: {}",
                    other
                ))),
            },
            StopWordsConfig::List(words) => Ok(StopWords::new(words)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default)]
    pub stop_words: StopWordsConfig,
    #[serde(default)]
    pub tokenizer: Tokenizer,
    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f64,
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_min_top_n")]
    pub min_top_n: usize,
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_features: default_max_features(),
            stop_words: StopWordsConfig::default(),
            tokenizer: Tokenizer::default(),
            fuzzy_cutoff: default_fuzzy_cutoff(),
            default_top_n: default_top_n(),
            min_top_n: default_min_top_n(),
            max_top_n: default_max_top_n(),
        }
    }
}

impl EngineConfig {
    pub fn settings(&self) -> Result<EngineSettings, ConfigError> {
        Ok(EngineSettings {
            max_features: self.max_features,
            stop_words: self.stop_words.to_stop_words()?,
            tokenizer: self.tokenizer,
        })
    }

    /// Requested result count if it lies within the configured bounds,
    /// otherwise the default.
    pub fn top_n(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(n) if (self.min_top_n..=self.max_top_n).contains(&n) => n,
            _ => self.default_top_n,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    pub api_key: String,
    #[serde(default = "default_tmdb_url")]
    pub base_url: String,
    #[serde(default = "default_image_url")]
    pub image_base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> String {
    "8000".to_string()
}

fn default_max_features() -> usize {
    5000
}

fn default_fuzzy_cutoff() -> f64 {
    crate::engine::DEFAULT_CUTOFF
}

fn default_top_n() -> usize {
    6
}

fn default_min_top_n() -> usize {
    3
}

fn default_max_top_n() -> usize {
    10
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if !(0.0..=1.0).contains(&engine.fuzzy_cutoff) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_cutoff must be within [0, 1], got {}",
                engine.fuzzy_cutoff
            )));
        }
        if engine.min_top_n == 0
            || engine.min_top_n > engine.max_top_n
            || !(engine.min_top_n..=engine.max_top_n).contains(&engine.default_top_n)
        {
            return Err(ConfigError::Invalid(format!(
                "top_n bounds are inconsistent: min {} default {} max {}",
                engine.min_top_n, engine.default_top_n, engine.max_top_n
            )));
        }
        engine.stop_words.to_stop_words()?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
