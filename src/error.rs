//! Error types for the Bookswap server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    StoreFailure = 3,
    NoSuchUser = 4,
    NoSuchBook = 5,
    StoreUnavailable = 6,
    NoSuchMatch = 7,
    TradeConflict = 8,
    BadValue = 18,
}

/// What a `NotFound` error failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Book,
    Match,
}

impl Resource {
    fn code(self) -> ErrorCode {
        match self {
            Resource::User => ErrorCode::NoSuchUser,
            Resource::Book => ErrorCode::NoSuchBook,
            Resource::Match => ErrorCode::NoSuchMatch,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {message}")]
    NotFound { resource: Resource, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store state changed between planning and applying a transfer
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {message}")]
    Store { message: String, retryable: bool },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// User lookup failure
    pub fn user_not_found(id: impl std::fmt::Display) -> Self {
        AppError::NotFound {
            resource: Resource::User,
            message: format!("User with id {} not found", id),
        }
    }

    /// Book lookup failure
    pub fn book_not_found(id: impl std::fmt::Display) -> Self {
        AppError::NotFound {
            resource: Resource::Book,
            message: format!("Book with id {} not found", id),
        }
    }

    /// Both users exist but no swap is possible between them
    pub fn match_not_found(user_id: impl std::fmt::Display, counterparty_id: impl std::fmt::Display) -> Self {
        AppError::NotFound {
            resource: Resource::Match,
            message: format!("User with id {} has no swap with {}", counterparty_id, user_id),
        }
    }

    /// A transfer would remove books the user no longer owns
    pub fn inventory_conflict(user_id: impl std::fmt::Display) -> Self {
        AppError::Conflict(format!(
            "User with id {} no longer owns every book in the trade",
            user_id
        ))
    }

    /// Store call that exceeded its deadline
    pub fn store_timeout(operation: &str) -> Self {
        AppError::Store {
            message: format!("{} timed out", operation),
            retryable: true,
        }
    }

    /// Whether the caller may retry the failed operation
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Store { retryable, .. } => *retryable,
            AppError::Conflict(_) => true,
            AppError::Database(e) => is_transient(e),
            _ => false,
        }
    }
}

fn is_transient(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Whether retrying the same request may succeed
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, code, message) = match &self {
            AppError::NotFound { resource, message } => {
                (StatusCode::NOT_FOUND, resource.code(), message.clone())
            }
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Conflict(msg) => {
                tracing::info!("Trade conflict: {}", msg);
                (StatusCode::CONFLICT, ErrorCode::TradeConflict, msg.clone())
            }
            AppError::Store { message, .. } if retryable => {
                tracing::warn!("Retryable store error: {}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::StoreUnavailable,
                    message.clone(),
                )
            }
            AppError::Store { message, .. } => {
                tracing::error!("Store error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StoreFailure,
                    "Store error".to_string(),
                )
            }
            AppError::Database(e) if retryable => {
                tracing::warn!("Transient database error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::StoreUnavailable,
                    "Database temporarily unavailable".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StoreFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            retryable,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        assert!(AppError::store_timeout("get_user").is_retryable());
        assert!(!AppError::user_not_found("u1").is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        let resp = AppError::user_not_found("u1").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::InvalidInput("bad".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::store_timeout("list_users").into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = AppError::Store {
            message: "constraint".into(),
            retryable: false,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = AppError::Conflict("stale".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_code_follows_resource() {
        assert_eq!(AppError::user_not_found("u1").into_response().status(), StatusCode::NOT_FOUND);

        let codes = [
            (AppError::user_not_found("u1"), ErrorCode::NoSuchUser),
            (AppError::book_not_found("b1"), ErrorCode::NoSuchBook),
            (AppError::match_not_found("u1", "u2"), ErrorCode::NoSuchMatch),
        ];
        for (err, expected) in codes {
            match err {
                AppError::NotFound { resource, .. } => assert_eq!(resource.code(), expected),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_conflict_is_retryable() {
        assert!(AppError::Conflict("book moved".into()).is_retryable());
    }
}
