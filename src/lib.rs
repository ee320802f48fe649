pub mod carousel;
pub mod config;
pub mod error;
pub mod favorites;
pub mod middleware;
pub mod model;
pub mod render;
pub mod server;
pub mod tmdb;
pub mod web;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use favorites::{FavoritesAggregator, HttpFavoritesBackend, SessionRegistry};
use tmdb::TmdbClient;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Server error: {0}")]
    Server(String),
}

pub async fn run(config_path: &str, debug_logs: bool) -> Result<(), ServerError> {
    let mut config = config::Config::from_file(config_path)?;
    config.debug_logs = debug_logs;

    info!("Using config file: {}", config_path);
    info!("Favorites backend: {}", config.backend.base_url);
    info!("Metadata service: {}", config.tmdb.base_url);
    info!("Batch policy: {:?}", config.fetch.policy);
    if debug_logs {
        info!("Debug logging enabled");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch.timeout_secs))
        .user_agent(concat!("favreel/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ServerError::Server(format!("Failed to create HTTP client: {}", e)))?;

    let backend = Arc::new(HttpFavoritesBackend::new(
        http.clone(),
        config.backend.base_url.clone(),
    ));
    let metadata = Arc::new(TmdbClient::new(http, &config.tmdb));
    let aggregator = Arc::new(FavoritesAggregator::new(
        backend,
        metadata,
        config.fetch.policy,
    ));

    let sessions = Arc::new(SessionRegistry::new(
        aggregator,
        config.carousel.size,
        Duration::from_secs(config.sessions.idle_ttl_secs),
    ));
    sessions
        .clone()
        .start_background_expiry(config.sessions.sweep_interval_secs);

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let tls = match (&config.listen.tlscert, &config.listen.tlskey) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        _ => None,
    };

    let state = server::AppState::new(config, sessions);
    let app = server::make_service(state);

    if let Some((cert_path, key_path)) = tls {
        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app)
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
