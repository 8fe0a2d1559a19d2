pub mod api;
pub mod config;
pub mod engine;
pub mod metadata;
pub mod middleware;
pub mod server;
pub mod util;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use engine::{ArtifactCache, Corpus, Engine};
use metadata::{MetadataProvider, NoMetadata, TmdbClient};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Corpus error: {0}")]
    Corpus(#[from] engine::CorpusError),
    #[error("Engine error: {0}")]
    Engine(#[from] engine::EngineError),
    #[error("Metadata client error: {0}")]
    Metadata(#[from] metadata::MetadataError),
    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub debug_logs: bool,
    /// Ignore a stored artifact and rebuild the similarity model.
    pub rebuild: bool,
}

pub async fn run(config_path: &str, options: RunOptions) -> Result<(), ServerError> {
    let mut config = config::Config::from_file(config_path)?;
    config.debug_logs = options.debug_logs;

    info!("Using config file: {}", config_path);
    if options.debug_logs {
        info!("Debug logging enabled");
    }

    let engine = Arc::new(load_engine(&config, options.rebuild).await?);

    let metadata: Arc<dyn MetadataProvider> = match config.tmdb {
        Some(ref tmdb) => {
            info!("Fetching movie details from {}", tmdb.base_url);
            Arc::new(TmdbClient::new(tmdb.clone())?)
        }
        None => {
            info!("No TMDB configuration, serving recommendations without posters");
            Arc::new(NoMetadata)
        }
    };

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let tls = match (&config.listen.tlscert, &config.listen.tlskey) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        _ => None,
    };

    let state = server::AppState::new(config, engine, metadata);
    let app = server::build_router(state);

    if let Some((cert_path, key_path)) = tls {
        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    } else {
        info!("Serving HTTP on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    }

    Ok(())
}

/// Loads the corpus and builds (or restores) the similarity model on a
/// blocking thread.
pub async fn load_engine(config: &config::Config, rebuild: bool) -> Result<Engine, ServerError> {
    let settings = config.engine.settings()?;
    let corpus_path = config.corpus.path.clone();
    let cache = config
        .artifact
        .as_ref()
        .map(|artifact| ArtifactCache::new(artifact.path.clone()));

    tokio::task::spawn_blocking(move || -> Result<Engine, ServerError> {
        let corpus = Corpus::from_file(&corpus_path)?;
        info!("Loaded {} movies from {}", corpus.len(), corpus_path.display());

        let (engine, source) = Engine::load_or_build(corpus, &settings, cache.as_ref(), rebuild)?;
        info!(
            "Similarity model ready: {} movies, {} terms ({:?})",
            engine.corpus().len(),
            engine.vocabulary().len(),
            source
        );
        Ok(engine)
    })
    .await
    .map_err(|e| ServerError::Server(format!("Model build task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &std::path::Path, corpus: &str) -> config::Config {
        let corpus_path = dir.join("movies.json");
        std::fs::write(&corpus_path, corpus).unwrap();

        let yaml = format!(
            "corpus:\n  path: {}\nartifact:\n  path: {}\n",
            corpus_path.display(),
            dir.join("similarity.json").display()
        );
        let config: config::Config = serde_yaml::from_str(&yaml).unwrap();
        config.validate().unwrap();
        config
    }

    #[tokio::test]
    async fn test_load_engine_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(
            dir.path(),
            r#"[
                {"movie_id": 1, "title": "Avatar", "tags": "space alien war"},
                {"movie_id": 2, "title": "Aliens", "tags": "space alien marines"}
            ]"#,
        );

        let engine = load_engine(&config, false).await.unwrap();
        assert_eq!(engine.corpus().len(), 2);
        assert!(dir.path().join("similarity.json").exists());

        let again = load_engine(&config, false).await.unwrap();
        assert_eq!(again.matrix(), engine.matrix());
    }

    #[tokio::test]
    async fn test_load_engine_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "[]");

        let result = load_engine(&config, false).await;
        assert!(matches!(
            result,
            Err(ServerError::Engine(engine::EngineError::EmptyCorpus))
        ));
    }
}
