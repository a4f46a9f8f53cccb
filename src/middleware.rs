//! Cross-cutting HTTP layers.

use std::any::Any;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::error;

use crate::auth::Auth;

/// Paths reachable without a token.
const PUBLIC_PATHS: [&str; 3] = ["/", "/login", "/callback"];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || path.starts_with("/static/")
}

/// Lets public paths through and sends everyone else to the login flow
/// unless a valid (or refreshable) token is held. API calls get a 401
/// instead of a redirect.
pub async fn require_auth(State(auth): State<Auth>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if is_public(&path) {
        return next.run(request).await;
    }

    if auth.ensure_valid().await.is_some() {
        return next.run(request).await;
    }

    if path.starts_with("/api/") {
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

/// Turns a handler panic into a bare 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!("Request handler panicked: {}", detail);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
        ])
}

pub fn static_cache_control() -> HeaderValue {
    HeaderValue::from_static("public, max-age=86400")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths() {
        for path in ["/", "/login", "/callback", "/static/js/favorites.js"] {
            assert!(is_public(path), "{}", path);
        }
        for path in ["/search", "/favorites", "/api/favorites/add", "/about", "/staticx"] {
            assert!(!is_public(path), "{}", path);
        }
    }

    #[test]
    fn panic_becomes_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
