//! Authorization-code flow endpoints.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::{info, warn};

use super::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /login - Send the browser to the provider's consent screen.
pub async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.auth.authorization_url())
}

/// GET /callback - Finish the flow and store the tokens.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    if !params
        .state
        .as_deref()
        .is_some_and(|s| state.auth.verify_state(s))
    {
        warn!("OAuth callback with mismatched state");
        return Err(AppError::BadRequest("Invalid state parameter".into()));
    }

    if let Some(error) = params.error {
        warn!("Authorization denied: {}", error);
        return Err(AppError::BadRequest(format!("Authorization failed: {}", error)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    state.auth.exchange_code(&code).await.map_err(|e| {
        warn!("Token exchange failed: {}", e);
        AppError::Internal("Failed to exchange token".into())
    })?;

    info!("User logged in");
    Ok(Redirect::to("/"))
}

/// GET /logout
pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.auth.logout().await;
    Redirect::to("/")
}
