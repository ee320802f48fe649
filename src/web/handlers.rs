use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use std::fmt::Write;
use tracing::debug;

use super::auth::identity_from_request;
use super::html_response;
use crate::carousel::NavigationKind;
use crate::favorites::{FavoritesDisplay, FavoritesEvent, FavoritesViewState};
use crate::model::MovieId;
use crate::render::{escape, page, render_carousel, render_favorites};
use crate::server::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct FavoritesQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct CarouselQuery {
    #[serde(default)]
    pub action: Option<NavigationKind>,
    #[serde(default)]
    pub index: Option<usize>,
}

pub async fn favorites_page(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<FavoritesQuery>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let identity = identity_from_request(&username, &headers)?;

    let session = if params.refresh {
        state.sessions.refresh(identity).await
    } else {
        state.sessions.open(identity).await
    };
    let snapshot = session.snapshot().await;

    let body = render_favorites(&snapshot.favorites, &state.render_context(&username));
    Ok(html_response(page("Favourites", &body)))
}

/// Completion callback of the client-side delete control.
pub async fn movie_deleted(
    State(state): State<AppState>,
    Path((username, movie_id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let identity = identity_from_request(&username, &headers)?;
    let session = state
        .sessions
        .get(&identity)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let removed = session
        .apply(FavoritesEvent::MovieDeleted(MovieId(movie_id)))
        .await;
    debug!(user = %username, movie_id, removed, "Applied deletion callback");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn carousel_page(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<CarouselQuery>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let identity = identity_from_request(&username, &headers)?;
    let session = state.sessions.open(identity).await;

    let snapshot = match params.action {
        Some(kind) => {
            let action = kind
                .into_action(params.index)
                .ok_or(StatusCode::BAD_REQUEST)?;
            session.navigate(action).await.map_err(|e| {
                debug!(user = %username, "Rejected carousel navigation: {}", e);
                StatusCode::BAD_REQUEST
            })?
        }
        None => session.snapshot().await,
    };

    let mut body = String::new();
    match snapshot.favorites.display() {
        FavoritesDisplay::Loading => body.push_str("<div class=\"status\">Loading...</div>\n"),
        FavoritesDisplay::Failed(message) => {
            let _ = writeln!(body, "<div class=\"error\">{}</div>", escape(message));
        }
        FavoritesDisplay::Empty | FavoritesDisplay::Grid { .. } => {}
    }
    body.push_str(&render_carousel(
        &snapshot.carousel,
        &state.render_context(&username),
    ));

    Ok(html_response(page("Top Favourite Movies", &body)))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let identity = identity_from_request(&username, &headers)?;
    if state.sessions.close(&identity).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub async fn favorites_json(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FavoritesViewState>, StatusCode> {
    let identity = identity_from_request(&username, &headers)?;
    let session = state.sessions.open(identity).await;
    Ok(Json(session.snapshot().await.favorites))
}
