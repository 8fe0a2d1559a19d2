use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{MetadataError, MetadataProvider, MovieDetails};
use crate::config::TmdbConfig;

/// Subset of the TMDB movie resource that is shown next to recommendations.
#[derive(Debug, Deserialize)]
struct TmdbMovie {
    title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    poster_path: Option<String>,
}

impl TmdbMovie {
    fn into_details(self, image_base_url: &str) -> MovieDetails {
        let year = self
            .release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
            .map(|y| y.to_string());

        MovieDetails {
            title: self.title,
            overview: self.overview.unwrap_or_default(),
            year,
            rating: self.vote_average,
            poster: self
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|p| format!("{}{}", image_base_url, p)),
        }
    }
}

pub struct TmdbClient {
    client: reqwest::Client,
    config: TmdbConfig,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, MetadataError> {
        let url = format!(
            "{}/movie/{}",
            self.config.base_url.trim_end_matches('/'),
            movie_id
        );
        debug!("Fetching TMDB details for movie {}", movie_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("language", self.config.language.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status().as_u16()));
        }

        let movie: TmdbMovie = response.json().await?;
        Ok(movie.into_details(&self.config.image_base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_URL: &str = "https://image.tmdb.org/t/p/w500";

    #[test]
    fn test_into_details() {
        let json = r#"{
            "id": 19995,
            "title": "Avatar",
            "overview": "In the 22nd century...",
            "release_date": "2009-12-10",
            "vote_average": 7.2,
            "poster_path": "/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"
        }"#;
        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        let details = movie.into_details(IMAGE_URL);

        assert_eq!(details.title.as_deref(), Some("Avatar"));
        assert_eq!(details.year.as_deref(), Some("2009"));
        assert_eq!(details.rating, Some(7.2));
        assert_eq!(
            details.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/kyeqWdyUXW608qlYkRqosgbbJyK.jpg")
        );
    }

    #[test]
    fn test_missing_fields() {
        let json = r#"{"title": null, "release_date": "", "poster_path": null}"#;
        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        let details = movie.into_details(IMAGE_URL);

        assert_eq!(details, MovieDetails::default());
    }

    #[test]
    fn test_client_builds() {
        let config = TmdbConfig {
            api_key: "key".to_string(),
            base_url: "http://localhost:1".to_string(),
            image_base_url: IMAGE_URL.to_string(),
            language: "en-US".to_string(),
            timeout_secs: 1,
        };
        assert!(TmdbClient::new(config).is_ok());
    }
}
