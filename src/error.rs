// src/error.rs
use axum::{extract::rejection::{JsonRejection, PathRejection}, response::{IntoResponse, Response}, Json};
use http::StatusCode;
use serde_json::json;

use crate::database::StoreError;

#[derive(Debug)]
pub enum AppError {
    Store(StoreError),
    NotFound(String),
    BadRequest(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Store failures are reported to the caller as-is, with the same
        // status as any other rejected request.
        let (status, error_message) = match self {
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store operation failed");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn store_errors_become_bad_request_with_raw_message() {
        let response = AppError::from(StoreError::Sqlx(sqlx::Error::RowNotFound)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_of(response).await;
        assert_eq!(body["error"], sqlx::Error::RowNotFound.to_string());
    }

    #[tokio::test]
    async fn not_found_keeps_its_message() {
        let response = AppError::not_found("Product not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await["error"], "Product not found");
    }
}
