use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rand::Rng;
use serde_json::json;
use tracing::{debug, warn};

use super::types::*;
use crate::engine::{CorpusStats, EngineError, Recommendation};
use crate::metadata::{fetch_all, truncate_overview};
use crate::server::AppState;
use crate::util::QueryParams;

const TRENDING_COUNT: usize = 8;
const SIMILAR_COUNT: usize = 6;
const DEFAULT_PAGE_SIZE: usize = 100;

pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Json<MovieList> {
    let start_index = params.get_parsed::<usize>("startIndex").unwrap_or(0);
    let limit = params
        .get_parsed::<usize>("limit")
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let movies = state.engine.corpus().movies();
    let items = movies
        .iter()
        .skip(start_index)
        .take(limit)
        .map(MovieSummary::from)
        .collect();

    Json(MovieList {
        items,
        total_record_count: movies.len(),
        start_index,
    })
}

/// Picks a movie and returns its nearest neighbours. Selection order:
/// `random`, fuzzy `query`, exact `movie` title, then the first title in
/// the corpus.
pub async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let engine = &state.engine;
    let top_n = state.config.engine.top_n(params.get_parsed("n"));
    let query = params.get("query");
    let random = params.flag("random") && !engine.corpus().is_empty();

    let resolved = if random {
        None
    } else {
        query.and_then(|q| engine.resolve(q, state.config.engine.fuzzy_cutoff))
    };
    if let (false, Some(q), None) = (random, query, resolved) {
        debug!("No title close to {:?}", q);
    }

    let index = match (resolved, params.get("movie")) {
        _ if random => rand::thread_rng().gen_range(0..engine.corpus().len()),
        (Some(index), _) => index,
        (None, Some(title)) => engine
            .corpus()
            .index_of_title(title)
            .ok_or_else(|| ApiError::NotFound(format!("Unknown movie: {}", title)))?,
        (None, None) => 0,
    };

    let selected = engine
        .movie(index)
        .map(MovieSummary::from)
        .ok_or_else(|| ApiError::NotFound("Corpus is empty".to_string()))?;
    let recs = engine.recommend(index, top_n)?;

    Ok(Json(RecommendResponse {
        selected,
        query: query.map(|q| q.to_string()),
        query_matched: resolved.is_some(),
        top_n,
        recommendations: enrich(&state, &recs).await,
    }))
}

pub async fn trending(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecommendedMovie>>, ApiError> {
    let recs = state.engine.recommend(0, TRENDING_COUNT)?;
    Ok(Json(enrich(&state, &recs).await))
}

/// Details for any movie id. Ids outside the corpus get details only, with
/// no similar movies, and 404 when the catalogue has nothing either.
pub async fn movie_detail(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<MovieDetailResponse>, ApiError> {
    let engine = &state.engine;
    let movie = engine
        .corpus()
        .index_of_id(movie_id)
        .and_then(|index| engine.movie(index).map(|movie| (index, movie)));

    let details = match (state.metadata.movie_details(movie_id).await, movie) {
        (Ok(details), _) => details,
        (Err(e), Some(_)) => {
            warn!("Failed to fetch details for movie {}: {}", movie_id, e);
            Default::default()
        }
        (Err(e), None) => {
            debug!("No details for movie {} outside the corpus: {}", movie_id, e);
            return Err(ApiError::NotFound(format!("Unknown movie id: {}", movie_id)));
        }
    };

    let similar = match movie.map(|(index, _)| engine.recommend(index, SIMILAR_COUNT)) {
        Some(Ok(recs)) => enrich(&state, &recs).await,
        Some(Err(e)) => {
            warn!("No similar movies for {}: {}", movie_id, e);
            Vec::new()
        }
        None => Vec::new(),
    };

    let (title, year) = match movie {
        Some((_, movie)) => (
            details.title.unwrap_or_else(|| movie.title.clone()),
            details.year.or_else(|| movie.year.map(|y| y.to_string())),
        ),
        None => (details.title.unwrap_or_default(), details.year),
    };

    Ok(Json(MovieDetailResponse {
        movie_id,
        title,
        year,
        rating: details.rating,
        poster: details.poster,
        overview: truncate_overview(&details.overview, DETAIL_OVERVIEW_CHARS),
        similar,
    }))
}

pub async fn stats(State(state): State<AppState>) -> Json<CorpusStats> {
    Json(state.engine.stats())
}

async fn enrich(state: &AppState, recs: &[Recommendation]) -> Vec<RecommendedMovie> {
    let movies: Vec<_> = recs
        .iter()
        .filter_map(|rec| state.engine.movie(rec.index).map(|movie| (movie, rec)))
        .collect();
    let ids: Vec<i64> = movies.iter().map(|(movie, _)| movie.id).collect();

    let details = fetch_all(state.metadata.clone(), &ids).await;

    movies
        .into_iter()
        .zip(details)
        .map(|((movie, rec), details)| RecommendedMovie::new(movie, rec, details))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Engine(EngineError::UnknownMovie { .. })
            | ApiError::Engine(EngineError::UnknownMovieId(_)) => StatusCode::NOT_FOUND,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::engine::{Corpus, Engine, Movie, StopWords};
    use crate::metadata::{MetadataError, MetadataProvider, MovieDetails};
    use crate::server::build_router;

    struct StubMetadata;

    #[async_trait]
    impl MetadataProvider for StubMetadata {
        async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, MetadataError> {
            if movie_id == 597 || movie_id == 666 {
                return Err(MetadataError::Status(500));
            }
            Ok(MovieDetails {
                title: None,
                overview: "x".repeat(300),
                year: Some("2009".to_string()),
                rating: Some(7.5),
                poster: Some(format!("https://posters/{}.jpg", movie_id)),
            })
        }
    }

    fn state() -> AppState {
        let corpus = Corpus::new(vec![
            Movie::new(19995, "Avatar", "space alien war"),
            Movie::new(24428, "The Avengers", "alien invasion war"),
            Movie::new(597, "Titanic", "romance drama ship"),
            Movie::new(1, "Alien", "space alien horror"),
            Movie::new(2, "Love Actually", "romance comedy"),
        ])
        .unwrap();
        let engine = Engine::build(corpus, &StopWords::english(), 5000).unwrap();
        let config: Config = serde_yaml::from_str("corpus:\n  path: movies.json\n").unwrap();
        AppState::new(config, Arc::new(engine), Arc::new(StubMetadata))
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = build_router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_recommend_default_selection() {
        let (status, body) = get("/api/recommend").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"]["title"], "Avatar");
        assert_eq!(body["top_n"], 6);
        assert_eq!(body["query_matched"], false);

        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 4);
        // The Avengers and Alien tie at 2/3; corpus order decides.
        assert_eq!(recs[0]["title"], "The Avengers");
        assert_eq!(recs[1]["title"], "Alien");
        assert_eq!(recs[0]["poster"], "https://posters/24428.jpg");
        assert_eq!(recs[0]["overview"].as_str().unwrap().chars().count(), 183);
    }

    #[tokio::test]
    async fn test_recommend_fuzzy_query_wins() {
        let (status, body) = get("/api/recommend?query=titanik&movie=Avatar&n=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"]["movie_id"], 597);
        assert_eq!(body["query_matched"], true);
        assert_eq!(body["top_n"], 3);

        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0]["title"], "Love Actually");
    }

    #[tokio::test]
    async fn test_recommend_unmatched_query_falls_back_to_movie() {
        let (status, body) = get("/api/recommend?query=qqqqqq&movie=Alien&n=50").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"]["title"], "Alien");
        assert_eq!(body["query_matched"], false);
        assert_eq!(body["top_n"], 6);
    }

    #[tokio::test]
    async fn test_recommend_random_takes_priority() {
        let ids = [19995, 24428, 597, 1, 2];
        for _ in 0..10 {
            let (status, body) = get("/api/recommend?random=1&query=titanik&n=3").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["query_matched"], false);

            let selected = body["selected"]["movie_id"].as_i64().unwrap();
            assert!(ids.contains(&selected));

            let recs = body["recommendations"].as_array().unwrap();
            assert_eq!(recs.len(), 3);
            assert!(recs.iter().all(|r| r["movie_id"] != selected));
        }

        let (_, body) = get("/api/recommend?random=0&query=titanik").await;
        assert_eq!(body["selected"]["movie_id"], 597);
    }

    #[tokio::test]
    async fn test_recommend_unknown_title() {
        let (status, body) = get("/api/recommend?movie=Nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown movie: Nope");
    }

    #[tokio::test]
    async fn test_recommendation_survives_metadata_failure() {
        let (status, body) = get("/api/recommend?movie=Love%20Actually&n=3").await;
        assert_eq!(status, StatusCode::OK);

        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs[0]["movie_id"], 597);
        assert_eq!(recs[0]["title"], "Titanic");
        assert!(recs[0]["poster"].is_null());
    }

    #[tokio::test]
    async fn test_movie_detail() {
        let (status, body) = get("/api/movie/19995").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Avatar");
        assert_eq!(body["overview"].as_str().unwrap().chars().count(), 223);
        assert_eq!(body["similar"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_movie_detail_outside_corpus() {
        let (status, body) = get("/api/movie/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movie_id"], 42);
        assert_eq!(body["title"], "");
        assert_eq!(body["poster"], "https://posters/42.jpg");
        assert!(body["similar"].as_array().unwrap().is_empty());

        let (status, body) = get("/api/movie/666").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown movie id: 666");
    }

    #[tokio::test]
    async fn test_trending_and_stats() {
        let (status, body) = get("/api/trending").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (status, body) = get("/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_movies"], 5);
        assert_eq!(body["top_tags"][0]["tag"], "alien");
    }

    #[tokio::test]
    async fn test_list_movies_paginated() {
        let (status, body) = get("/api/movies?startIndex=1&limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_record_count"], 5);
        assert_eq!(body["start_index"], 1);

        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "The Avengers");
    }

    #[tokio::test]
    async fn test_fallback() {
        let (status, body) = get("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}
