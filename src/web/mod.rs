pub mod auth;
pub mod handlers;

pub use handlers::*;

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

/// HTML response with a strong ETag over the body, so unchanged pages can
/// be answered with 304 by the etag middleware.
pub fn html_response(body: String) -> Response {
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(body.as_bytes())));
    let mut response = axum::response::Html(body).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
