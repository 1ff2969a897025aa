//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use salesdesk_core::error::{AppError, ErrorCode};
use salesdesk_core::types::response::ApiErrorResponse;

/// Handler error type. Wraps `AppError` so the response mapping can live
/// in this crate.
#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if err.is_operational() {
            ApiErrorResponse::new(err.message, err.code)
        } else {
            error!(kind = %err.kind, error = %err, source = ?err.source, "Internal server error");
            ApiErrorResponse::new("Internal server error", ErrorCode::InternalServerError)
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use salesdesk_core::error::ErrorKind;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn operational_errors_keep_message_and_code() {
        let response = ApiError(AppError::account_locked()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert_eq!(body["errorCode"], "ACCOUNT_LOCKED");
    }

    #[tokio::test]
    async fn internal_errors_are_generic() {
        let response =
            ApiError(AppError::new(ErrorKind::Database, "relation \"accounts\" does not exist"))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["errorCode"], "INTERNAL_SERVER_ERROR");
    }
}
