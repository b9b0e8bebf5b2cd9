//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the game API.
///
/// `NotFound` deliberately covers both "does not exist" and "not addressed to
/// the caller" so that gift ids cannot be probed for other users' gifts.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Entity absent, or not visible to the caller
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Operation conflicts with current state (already-settled gift,
    /// insufficient funds, character not owned)
    #[error("{0}")]
    InvalidState(String),

    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Underlying storage failure; detail is logged server-side only
    #[error("Storage failure")]
    Storage(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Storage(ref e) => {
                tracing::error!("Storage failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage failure".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        let cases = [
            (ApiError::NotFound("Gift"), StatusCode::NOT_FOUND),
            (
                ApiError::InvalidState("Insufficient funds".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Validation("Username is required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Storage(sqlx::Error::PoolClosed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_not_found_message_is_uniform() {
        assert_eq!(ApiError::NotFound("Gift").to_string(), "Gift not found");
    }
}
