//! JSON endpoints behind the favorite toggle buttons.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::AppError;
use crate::favorites::NewFavorite;
use crate::kind::ItemKind;

/// Body of an add request. The timestamp is always taken on the server.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
}

impl From<AddRequest> for NewFavorite {
    fn from(request: AddRequest) -> Self {
        NewFavorite {
            id: request.id,
            kind: request.kind,
            name: request.name,
            image_url: request.image_url,
            added_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))
}

fn require_id(id: &str) -> Result<(), AppError> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing item id".into()));
    }
    Ok(())
}

/// POST /api/favorites/add
pub async fn add(
    State(state): State<AppState>,
    payload: Result<Json<AddRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = body(payload)?;
    require_id(&request.id)?;
    state.favorites.add(request.into())?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/favorites/remove
pub async fn remove(
    State(state): State<AppState>,
    payload: Result<Json<RemoveRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = body(payload)?;
    require_id(&request.id)?;
    state.favorites.remove(&request.id, request.kind)?;
    Ok(Json(json!({ "success": true })))
}
