use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::model::{Identity, MovieId};

const SERVICE: &str = "Favorites backend";

/// Source of a user's favorited movie ids.
#[async_trait]
pub trait FavoritesBackend: Send + Sync {
    async fn favorite_ids(&self, identity: &Identity) -> Result<Vec<MovieId>, FetchError>;
}

pub struct HttpFavoritesBackend {
    http: Client,
    base_url: String,
}

impl HttpFavoritesBackend {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn favorites_url(&self, username: &str) -> String {
        format!("{}/{}/favorites", self.base_url, urlencoding::encode(username))
    }
}

#[async_trait]
impl FavoritesBackend for HttpFavoritesBackend {
    async fn favorite_ids(&self, identity: &Identity) -> Result<Vec<MovieId>, FetchError> {
        let target = format!("favorites for {}", identity.username());
        let url = self.favorites_url(identity.username());
        debug!(url = %url, "Fetching favorite ids");

        let response = self
            .http
            .get(&url)
            .bearer_auth(identity.token())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                target: target.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(SERVICE, target, status.as_u16()));
        }

        response
            .json::<Vec<MovieId>>()
            .await
            .map_err(|e| FetchError::Decode { target, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use tokio::net::TcpListener;

    async fn favorites_handler(
        Path(username): Path<String>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<i64>>, StatusCode> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Bearer good-token" {
            return Err(StatusCode::UNAUTHORIZED);
        }
        match username.as_str() {
            "alice" => Ok(Json(vec![27205, 157336])),
            "jane doe" => Ok(Json(vec![550])),
            _ => Ok(Json(vec![])),
        }
    }

    async fn spawn_backend() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new().route("/:username/favorites", get(favorites_handler));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_fetch_ids_with_bearer_token() {
        let backend = HttpFavoritesBackend::new(Client::new(), spawn_backend().await);
        let identity = Identity::new("alice", "good-token").unwrap();
        let ids = backend.favorite_ids(&identity).await.expect("ids");
        assert_eq!(ids, vec![MovieId(27205), MovieId(157336)]);
    }

    #[tokio::test]
    async fn test_username_is_one_path_segment() {
        let backend = HttpFavoritesBackend::new(Client::new(), spawn_backend().await);
        let identity = Identity::new("jane doe", "good-token").unwrap();
        let ids = backend.favorite_ids(&identity).await.expect("ids");
        assert_eq!(ids, vec![MovieId(550)]);
    }

    #[tokio::test]
    async fn test_rejected_token_is_an_error() {
        let backend = HttpFavoritesBackend::new(Client::new(), spawn_backend().await);
        let identity = Identity::new("alice", "stale-token").unwrap();
        let err = backend.favorite_ids(&identity).await.expect_err("must fail");
        assert_eq!(
            err.to_string(),
            "Favorites backend responded with HTTP 401 for favorites for alice"
        );
    }
}
