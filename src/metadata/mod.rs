pub mod tmdb;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

pub use tmdb::TmdbClient;

/// Display details for a movie, as provided by a remote catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovieDetails {
    pub title: Option<String>,
    pub overview: String,
    pub year: Option<String>,
    pub rating: Option<f64>,
    pub poster: Option<String>,
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, MetadataError>;
}

/// Provider used when no remote catalogue is configured.
pub struct NoMetadata;

#[async_trait]
impl MetadataProvider for NoMetadata {
    async fn movie_details(&self, _movie_id: i64) -> Result<MovieDetails, MetadataError> {
        Ok(MovieDetails::default())
    }
}

/// Fetches details for all ids concurrently. Results keep the order of
/// `movie_ids`; failed lookups come back as `None`.
pub async fn fetch_all(
    provider: Arc<dyn MetadataProvider>,
    movie_ids: &[i64],
) -> Vec<Option<MovieDetails>> {
    let mut tasks = JoinSet::new();
    for (slot, &movie_id) in movie_ids.iter().enumerate() {
        let provider = provider.clone();
        tasks.spawn(async move { (slot, movie_id, provider.movie_details(movie_id).await) });
    }

    let mut results = vec![None; movie_ids.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, _, Ok(details))) => results[slot] = Some(details),
            Ok((_, movie_id, Err(e))) => {
                warn!("Failed to fetch details for movie {}: {}", movie_id, e)
            }
            Err(e) => warn!("Metadata task failed: {}", e),
        }
    }
    results
}

/// Shortens an overview to `max_chars` characters, marking the cut with "...".
pub fn truncate_overview(overview: &str, max_chars: usize) -> String {
    match overview.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &overview[..cut]),
        None => overview.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {0}")]
    Status(u16),
}
