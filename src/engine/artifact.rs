use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use tempfile::NamedTempFile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::similarity::SimilarityMatrix;
use super::vocabulary::Vocabulary;

const ARTIFACT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ArtifactFile {
    version: u32,
    movies: usize,
    created: DateTime<Utc>,
    vocabulary: Vocabulary,
    /// Row-major upper triangle, diagonal included.
    similarity: Vec<f64>,
}

/// Vocabulary and similarity matrix restored from disk.
#[derive(Debug, Clone)]
pub struct CachedModel {
    pub vocabulary: Vocabulary,
    pub matrix: SimilarityMatrix,
    pub created: DateTime<Utc>,
}

/// Single-file store for the precomputed model.
///
/// A stored artifact is trusted as long as it was built for the same number
/// of movies as the current corpus; its contents are not compared.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    path: PathBuf,
}

impl ArtifactCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been stored yet.
    pub fn load(&self, expected_movies: usize) -> Result<Option<CachedModel>, ArtifactError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No artifact at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(ArtifactError::Io(self.path.display().to_string(), e)),
        };

        let artifact: ArtifactFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ArtifactError::Parse(self.path.display().to_string(), e))?;

        if artifact.version != ARTIFACT_VERSION {
            return Err(ArtifactError::Version(artifact.version));
        }
        if artifact.movies != expected_movies {
            return Err(ArtifactError::Incompatible {
                expected: expected_movies,
                found: artifact.movies,
            });
        }

        let matrix = SimilarityMatrix::from_packed_upper(artifact.movies, &artifact.similarity)
            .ok_or(ArtifactError::Incompatible {
                expected: expected_movies,
                found: artifact.similarity.len(),
            })?;

        info!(
            "Loaded {}x{} similarity matrix from {}",
            matrix.len(),
            matrix.len(),
            self.path.display()
        );

        Ok(Some(CachedModel {
            vocabulary: artifact.vocabulary,
            matrix,
            created: artifact.created,
        }))
    }

    /// Writes a temp file next to the target and renames it into place, so
    /// readers never see a partial file. The temp file is removed when any
    /// step fails.
    pub fn store(
        &self,
        vocabulary: &Vocabulary,
        matrix: &SimilarityMatrix,
    ) -> Result<(), ArtifactError> {
        let io_err = |e: std::io::Error| ArtifactError::Io(self.path.display().to_string(), e);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let artifact = ArtifactFile {
            version: ARTIFACT_VERSION,
            movies: matrix.len(),
            created: Utc::now(),
            vocabulary: vocabulary.clone(),
            similarity: matrix.packed_upper(),
        };

        let tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer(&mut writer, &artifact)
            .map_err(|e| ArtifactError::Parse(self.path.display().to_string(), e))?;
        writer.flush().map_err(io_err)?;
        let tmp = writer.into_inner().map_err(|e| io_err(e.into_error()))?;

        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        info!("Stored similarity artifact at {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact I/O error on {0}: {1}")]
    Io(String, std::io::Error),
    #[error("Malformed artifact {0}: {1}")]
    Parse(String, serde_json::Error),
    #[error("Unsupported artifact version {0}")]
    Version(u32),
    #[error("Artifact built for {found} movies, corpus has {expected}")]
    Incompatible { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stopwords::StopWords;
    use crate::engine::tokenizer::Tokenizer;
    use crate::engine::vectorizer::Vectorizer;

    fn model(tags: &[&str]) -> (Vocabulary, SimilarityMatrix) {
        let vocab = Vocabulary::build(
            tags.iter().copied(),
            &StopWords::none(),
            10,
            Tokenizer::Whitespace,
        )
        .unwrap();
        let vectors = Vectorizer::new(&vocab, Tokenizer::Whitespace).transform_all(tags);
        (vocab, SimilarityMatrix::build(&vectors))
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path().join("models/similarity.json"));
        let (vocab, matrix) = model(&["space alien war", "alien invasion war", "romance drama"]);

        cache.store(&vocab, &matrix).unwrap();
        let loaded = cache.load(3).unwrap().unwrap();

        assert_eq!(loaded.matrix, matrix);
        assert_eq!(loaded.vocabulary, vocab);
        assert!(loaded.created <= Utc::now());
        assert_eq!(fs::read_dir(dir.path().join("models")).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_store_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("similarity.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let cache = ArtifactCache::new(&target);
        let (vocab, matrix) = model(&["a b", "b c"]);
        assert!(matches!(
            cache.store(&vocab, &matrix),
            Err(ArtifactError::Io(_, _))
        ));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("similarity.json")]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path().join("similarity.json"));
        assert!(cache.load(3).unwrap().is_none());
    }

    #[test]
    fn test_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path().join("similarity.json"));
        let (vocab, matrix) = model(&["a b", "b c"]);
        cache.store(&vocab, &matrix).unwrap();

        assert!(matches!(
            cache.load(3),
            Err(ArtifactError::Incompatible {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.json");
        fs::write(&path, "not json").unwrap();

        let cache = ArtifactCache::new(&path);
        assert!(matches!(cache.load(1), Err(ArtifactError::Parse(_, _))));
    }

    #[test]
    fn test_truncated_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.json");
        let json = concat!(
            r#"{"version":1,"movies":2,"created":"2024-01-01T00:00:00Z","#,
            r#""vocabulary":["a"],"similarity":[1.0,0.5]}"#,
        );
        fs::write(&path, json).unwrap();

        let cache = ArtifactCache::new(&path);
        assert!(matches!(
            cache.load(2),
            Err(ArtifactError::Incompatible { .. })
        ));
    }
}
