use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::TmdbErrorBody;
use crate::config::TmdbConfig;
use crate::error::FetchError;
use crate::model::{Movie, MovieId};

const SERVICE: &str = "TMDB";

/// Resolves a movie id to its display attributes.
#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn movie(&self, id: MovieId) -> Result<Movie, FetchError>;
}

pub struct TmdbClient {
    http: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(http: Client, config: &TmdbConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        }
    }

    fn movie_url(&self, id: MovieId) -> String {
        format!("{}/movie/{}", self.base_url, id)
    }
}

#[async_trait]
impl MetadataService for TmdbClient {
    async fn movie(&self, id: MovieId) -> Result<Movie, FetchError> {
        let target = format!("movie {}", id);
        debug!(movie_id = %id, "Fetching movie details");

        let response = self
            .http
            .get(self.movie_url(id))
            .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                target: target.clone(),
                source: e.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<TmdbErrorBody>()
                .await
                .ok()
                .and_then(|b| b.status_message);
            return Err(FetchError::Status {
                service: SERVICE,
                target,
                status: status.as_u16(),
                message,
            });
        }

        response.json::<Movie>().await.map_err(|e| FetchError::Decode {
            target,
            source: e.without_url(),
        })
    }
}

/// Full poster image URL for a TMDB `poster_path`.
pub fn poster_url(image_base_url: &str, poster_path: &str) -> String {
    format!(
        "{}/{}",
        image_base_url.trim_end_matches('/'),
        poster_path.trim_start_matches('/')
    )
}
