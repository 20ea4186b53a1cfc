//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::domain::{Book, Member};
use crate::error::AppError;
use crate::lending::{BorrowCommand, ReturnCommand};

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

/// Body of `POST /borrow`. Missing or null codes are treated as unknown codes.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub member_code: Option<String>,
    pub book_code: Option<String>,
}

/// Body of `POST /return`. Missing or null `daysLate` counts as on time.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub member_code: Option<String>,
    pub book_code: Option<String>,
    pub days_late: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/borrow", post(borrow))
        .route("/return", post(return_book))
        .route("/books", get(list_books))
        .route("/members", get(list_members))
}

// =========================================================================
// POST /borrow
// =========================================================================

/// Lend a book to a member
async fn borrow(
    State(state): State<AppState>,
    payload: Result<Json<BorrowRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload?;

    state
        .engine
        .borrow(BorrowCommand::new(
            request.member_code.unwrap_or_default(),
            request.book_code.unwrap_or_default(),
        ))
        .await?;

    Ok(Json(MessageResponse::new("Book borrowed successfully")))
}

// =========================================================================
// POST /return
// =========================================================================

/// Take a book back from a member
async fn return_book(
    State(state): State<AppState>,
    payload: Result<Json<ReturnRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload?;

    let command = ReturnCommand::new(
        request.member_code.unwrap_or_default(),
        request.book_code.unwrap_or_default(),
    )
    .with_days_late(request.days_late.unwrap_or_default());
    state.engine.return_book(command).await?;

    Ok(Json(MessageResponse::new("Book returned successfully")))
}

// =========================================================================
// GET /books, GET /members
// =========================================================================

async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.engine.list_books().await?))
}

async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(state.engine.list_members().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_request_deserialize() {
        let json = r#"{ "memberCode": "M001", "bookCode": "JK-45" }"#;

        let request: BorrowRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.member_code.as_deref(), Some("M001"));
        assert_eq!(request.book_code.as_deref(), Some("JK-45"));
    }

    #[test]
    fn test_return_request_deserialize() {
        let json = r#"{ "memberCode": "M002", "bookCode": "TW-11", "daysLate": 8 }"#;

        let request: ReturnRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.days_late, Some(8));
    }

    #[test]
    fn test_missing_and_null_fields_are_absent() {
        let request: ReturnRequest = serde_json::from_str("{}").unwrap();
        assert!(request.member_code.is_none());
        assert!(request.book_code.is_none());
        assert!(request.days_late.is_none());

        let json = r#"{ "memberCode": null, "bookCode": "JK-45", "daysLate": null }"#;
        let request: ReturnRequest = serde_json::from_str(json).unwrap();
        assert!(request.member_code.is_none());
        assert!(request.days_late.is_none());
    }
}
