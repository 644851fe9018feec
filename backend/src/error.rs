use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced to whoever drives the checklist: the HTTP layer renders
/// them as JSON, a local client shows them inline or as a banner.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Auth(String),
    #[error("could not reach the task store: {0}")]
    Connectivity(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures at the store seam.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::Connectivity(e.to_string()),
            StoreError::Conflict(what) => AppError::Conflict(format!("{what} already exists")),
            StoreError::Corrupt(msg) => AppError::Internal(msg),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        let conflict: AppError = StoreError::Conflict("username".to_string()).into();
        assert!(matches!(conflict, AppError::Conflict(_)));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let down: AppError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(down, AppError::Connectivity(_)));
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
