//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::LendingError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Domain errors; store failures inside become 5xx
    #[error(transparent)]
    Lending(#[from] LendingError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

const INTERNAL_SERVER_ERROR: &str = "Internal server error";

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Lending(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Lending(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Lending(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Lending(LendingError::PersistenceFailure(cause)) => {
                tracing::error!(error = ?cause, "Catalog store failure");
                INTERNAL_SERVER_ERROR.to_string()
            }
            AppError::Lending(err) => {
                tracing::debug!(error = ?err, status = %status, "Lending request rejected");
                err.to_string()
            }
            AppError::InvalidRequest(_) => self.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::from(LendingError::member_not_found("X999"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = AppError::from(LendingError::book_not_found("NOPE"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_rule_violations_map_to_400() {
        let errors = [
            LendingError::BorrowLimitExceeded { member_code: "M001".into() },
            LendingError::OutOfStock { book_code: "JK-45".into() },
            LendingError::MemberPenalized { member_code: "M001".into() },
            LendingError::BookNotBorrowed {
                member_code: "M001".into(),
                book_code: "JK-45".into(),
            },
        ];

        for err in errors {
            assert_eq!(AppError::from(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_persistence_failure_maps_to_500() {
        let err = AppError::from(LendingError::from(StoreError::Corrupt("bad row".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_shape() {
        let body = ErrorResponse {
            error: "Book not found".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "error": "Book not found" })
        );
    }
}
