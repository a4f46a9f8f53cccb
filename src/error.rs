use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::catalog::CatalogError;
use crate::favorites::StoreError;

/// Application error type. Rendered as a plain-text body.
#[derive(Debug)]
pub enum AppError {
    Upstream(String),
    BadRequest(String),
    Unauthorized,
    Internal(String),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotAuthenticated => AppError::Unauthorized,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Upstream(msg) | AppError::BadRequest(msg) | AppError::Internal(msg) => msg,
            AppError::Unauthorized => "Unauthorized",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.message().to_string()).into_response()
    }
}
