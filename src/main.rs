mod auth;
mod catalog;
mod config;
mod error;
mod favorites;
mod handlers;
mod kind;
mod middleware;
mod pagination;
mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::Auth;
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::favorites::FavoritesStore;
use crate::handlers::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let favorites = FavoritesStore::open(&config.data_dir)?;
    tracing::info!("favorites stored at {}", favorites.path().display());

    let auth = Auth::new(config.oauth);
    let catalog = CatalogClient::new(auth.clone(), config.api_base);
    let state = AppState {
        auth,
        catalog,
        favorites: Arc::new(favorites),
        pagination: config.pagination,
    };

    let app = app(state, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on http://{}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
