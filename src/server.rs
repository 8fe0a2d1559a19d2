use axum::{
    extract::Request,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::engine::Engine;
use crate::metadata::MetadataProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<Engine>,
    pub metadata: Arc<dyn MetadataProvider>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<Engine>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            metadata,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/movies", get(crate::api::list_movies))
        .route("/api/recommend", get(crate::api::recommend))
        .route("/api/trending", get(crate::api::trending))
        .route("/api/movie/:id", get(crate::api::movie_detail))
        .route("/api/stats", get(crate::api::stats));

    Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(api_routes)
        .fallback(fallback_handler)
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
