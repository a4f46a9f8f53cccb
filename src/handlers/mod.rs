//! HTTP handlers and the route table.

mod favorites;
mod login;
mod pages;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::header,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer, services::ServeDir, set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::auth::Auth;
use crate::catalog::CatalogClient;
use crate::favorites::FavoritesStore;
use crate::middleware::{cors, handle_panic, require_auth, static_cache_control};
use crate::pagination::PaginationDefaults;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Auth,
    pub catalog: CatalogClient,
    pub favorites: Arc<FavoritesStore>,
    pub pagination: PaginationDefaults,
}

/// Builds the complete application: routes, static files and middleware.
pub fn app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_files = Router::new()
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            static_cache_control(),
        ));

    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(login::login))
        .route("/callback", get(login::callback))
        .route("/logout", get(login::logout))
        .route("/search", get(pages::search))
        .route("/collection", get(pages::collection))
        .route("/artist/:id", get(pages::artist))
        .route("/album/:id", get(pages::album))
        .route("/track/:id", get(pages::track))
        .route("/favorites", get(pages::favorites))
        .route("/category/:genre", get(pages::category))
        .route("/about", get(pages::about))
        .route("/api/favorites/add", post(favorites::add))
        .route("/api/favorites/remove", post(favorites::remove))
        .fallback(pages::not_found)
        .merge(static_files)
        .layer(middleware::from_fn_with_state(state.auth.clone(), require_auth))
        .with_state(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}
