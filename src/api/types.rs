use serde::{Deserialize, Serialize};

use crate::engine::{Movie, Recommendation};
use crate::metadata::{truncate_overview, MovieDetails};

/// Overview length in recommendation lists.
pub const LIST_OVERVIEW_CHARS: usize = 180;
/// Overview length on the movie detail view.
pub const DETAIL_OVERVIEW_CHARS: usize = 220;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub movie_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieList {
    pub items: Vec<MovieSummary>,
    pub total_record_count: usize,
    pub start_index: usize,
}

/// A recommendation with whatever display details could be fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedMovie {
    pub movie_id: i64,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub rating: Option<f64>,
    pub similarity: f64,
    pub overview: String,
}

impl RecommendedMovie {
    pub fn new(movie: &Movie, rec: &Recommendation, details: Option<MovieDetails>) -> Self {
        let details = details.unwrap_or_default();
        Self {
            movie_id: movie.id,
            title: details.title.unwrap_or_else(|| movie.title.clone()),
            year: details.year.or_else(|| movie.year.map(|y| y.to_string())),
            poster: details.poster,
            rating: details.rating,
            similarity: rec.score,
            overview: truncate_overview(&details.overview, LIST_OVERVIEW_CHARS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub selected: MovieSummary,
    pub query: Option<String>,
    pub query_matched: bool,
    pub top_n: usize,
    pub recommendations: Vec<RecommendedMovie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetailResponse {
    pub movie_id: i64,
    pub title: String,
    pub year: Option<String>,
    pub rating: Option<f64>,
    pub poster: Option<String>,
    pub overview: String,
    pub similar: Vec<RecommendedMovie>,
}
