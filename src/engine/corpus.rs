use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// A single movie as loaded from the corpus file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(alias = "movie_id")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub year: Option<i32>,
}

impl Movie {
    pub fn new(id: i64, title: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tags: tags.into(),
            year: None,
        }
    }
}

/// Ordered, immutable set of movies. A movie's corpus index is its
/// position in `movies`.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    movies: Vec<Movie>,
    index_by_id: HashMap<i64, usize>,
}

/// Accepted on-disk layouts: a list of records, or the column-oriented
/// mapping written by a dataframe `to_dict()` export.
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Records(Vec<Movie>),
    Columns(ColumnLayout),
}

/// Row keys arrive as JSON object keys (`"0"`, `"1"`, ...) and are ordered
/// numerically.
#[derive(Deserialize)]
struct ColumnLayout {
    #[serde(alias = "id")]
    movie_id: HashMap<String, i64>,
    title: HashMap<String, String>,
    #[serde(default)]
    tags: HashMap<String, Option<String>>,
    #[serde(default)]
    year: HashMap<String, Option<i32>>,
}

fn by_row<T>(column: &str, values: HashMap<String, T>) -> Result<BTreeMap<u64, T>, CorpusError> {
    values
        .into_iter()
        .map(|(key, value)| match key.trim().parse::<u64>() {
            Ok(row) => Ok((row, value)),
            Err(_) => Err(CorpusError::RowKey(column.to_string(), key)),
        })
        .collect()
}

impl ColumnLayout {
    fn into_movies(self) -> Result<Vec<Movie>, CorpusError> {
        let movie_id = by_row("movie_id", self.movie_id)?;
        let mut title = by_row("title", self.title)?;
        let mut tags = by_row("tags", self.tags)?;
        let mut year = by_row("year", self.year)?;

        if title.len() != movie_id.len() {
            return Err(CorpusError::ColumnMismatch("title".to_string()));
        }
        if !tags.is_empty() && tags.len() != movie_id.len() {
            return Err(CorpusError::ColumnMismatch("tags".to_string()));
        }

        let mut movies = Vec::with_capacity(movie_id.len());
        for (row, id) in movie_id {
            let title = title
                .remove(&row)
                .ok_or_else(|| CorpusError::ColumnMismatch("title".to_string()))?;
            movies.push(Movie {
                id,
                title,
                tags: tags.remove(&row).flatten().unwrap_or_default(),
                year: year.remove(&row).flatten(),
            });
        }
        Ok(movies)
    }
}

impl Corpus {
    pub fn new(movies: Vec<Movie>) -> Result<Self, CorpusError> {
        let mut index_by_id = HashMap::with_capacity(movies.len());
        for (index, movie) in movies.iter().enumerate() {
            if index_by_id.insert(movie.id, index).is_some() {
                return Err(CorpusError::DuplicateId(movie.id));
            }
        }
        Ok(Self {
            movies,
            index_by_id,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, CorpusError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CorpusError::ReadError(path.display().to_string(), e))?;
        let corpus = Self::from_json(&content)
            .map_err(|e| match e {
                CorpusError::Parse(_, err) => CorpusError::Parse(path.display().to_string(), err),
                other => other,
            })?;
        debug!("Loaded {} movies from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn from_json(content: &str) -> Result<Self, CorpusError> {
        let file: CorpusFile = serde_json::from_str(content)
            .map_err(|e| CorpusError::Parse("<inline>".to_string(), e))?;
        let movies = match file {
            CorpusFile::Records(movies) => movies,
            CorpusFile::Columns(columns) => columns.into_movies()?,
        };
        Self::new(movies)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn index_of_id(&self, id: i64) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    /// First movie whose title equals `title` exactly.
    pub fn index_of_title(&self, title: &str) -> Option<usize> {
        self.movies.iter().position(|m| m.title == title)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.movies.iter().map(|m| m.title.as_str()).collect()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.tags.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Failed to read corpus file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse corpus file {0}: {1}")]
    Parse(String, serde_json::Error),
    #[error("Duplicate movie id {0}")]
    DuplicateId(i64),
    #[error("Column {0} does not line up with movie_id")]
    ColumnMismatch(String),
    #[error("Column {0} has non-numeric row key {1:?}")]
    RowKey(String, String),
}
