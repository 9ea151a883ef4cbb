//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tisana_core::CoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions, e.g.
    /// touching a mix owned by someone else.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient points for a payment.
    #[error("insufficient points: balance={balance}, required={required}")]
    InsufficientPoints {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// A one-time award was already granted.
    #[error("duplicate award: {0}")]
    DuplicateAward(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientPoints { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_points",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::DuplicateAward(marker) => (
                StatusCode::CONFLICT,
                "duplicate_award",
                format!("Award {marker} already granted"),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<tisana_store::StoreError> for ApiError {
    fn from(err: tisana_store::StoreError) -> Self {
        match err {
            tisana_store::StoreError::NotFound => Self::NotFound("Record not found".into()),
            tisana_store::StoreError::DuplicateAward { marker } => Self::DuplicateAward(marker),
            tisana_store::StoreError::Database(msg)
            | tisana_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientPoints { balance, required } => {
                Self::InsufficientPoints { balance, required }
            }
            CoreError::AccountNotFound { .. } | CoreError::MixNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            CoreError::NotOwner { .. } => Self::Forbidden,
            CoreError::AlreadyPublished { .. } => Self::Conflict(err.to_string()),
            CoreError::EmptyMix
            | CoreError::PackagingUnavailable { .. }
            | CoreError::CapacityExceeded { .. }
            | CoreError::InvalidWeight
            | CoreError::InvalidId(_) => Self::BadRequest(err.to_string()),
        }
    }
}
