use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, IntoMakeService},
    Router, ServiceExt,
};
use std::sync::Arc;
use tower::Layer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::favorites::SessionRegistry;
use crate::render::RenderContext;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }

    pub fn render_context<'a>(&'a self, username: &'a str) -> RenderContext<'a> {
        RenderContext {
            username,
            image_base_url: &self.config.tmdb.image_base_url,
            selectors: self.config.carousel.selectors,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route("/:username/favorites", get(crate::web::favorites_page))
        .route(
            "/:username/favorites/:movie_id/deleted",
            post(crate::web::movie_deleted),
        )
        .route("/:username/carousel", get(crate::web::carousel_page))
        .route("/:username/session", delete(crate::web::close_session));

    let api_routes = Router::new().route(
        "/api/:username/favorites",
        get(crate::web::favorites_json),
    );

    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(page_routes)
        .merge(api_routes)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::etag_validation))
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

/// The router behind trailing-slash trimming, which has to happen before
/// routing. Used for both the plain and the TLS listener.
pub fn make_service(state: AppState) -> IntoMakeService<NormalizePath<Router>> {
    let app = NormalizePathLayer::trim_trailing_slash().layer(build_router(state));
    ServiceExt::<Request>::into_make_service(app)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
