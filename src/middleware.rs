use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// One line per request. Server errors are logged at warn level.
pub async fn log_request(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), elapsed_ms, "Request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), ?length, elapsed_ms, "Request served");
    }

    response
}

/// Answers 304 when the response ETag matches the request's If-None-Match.
pub async fn etag_validation(req: Request, next: Next) -> Response {
    let if_none_match = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let response = next.run(req).await;

    let Some(client_etag) = if_none_match else {
        return response;
    };
    let matched = response
        .headers()
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|etag| etags_match(&client_etag, etag))
        .unwrap_or(false);
    if !matched {
        return response;
    }

    let mut not_modified = Response::new(axum::body::Body::empty());
    *not_modified.status_mut() = StatusCode::NOT_MODIFIED;
    let headers = not_modified.headers_mut();
    for name in [header::ETAG, header::CACHE_CONTROL, header::VARY] {
        if let Some(value) = response.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }
    not_modified
}

fn etags_match(client_etag: &str, server_etag: &str) -> bool {
    // If-None-Match may list several tags, and uses weak comparison.
    let server_stripped = server_etag.strip_prefix("W/").unwrap_or(server_etag);
    client_etag.split(',').map(str::trim).any(|etag| {
        etag == "*" || etag.strip_prefix("W/").unwrap_or(etag) == server_stripped
    })
}
