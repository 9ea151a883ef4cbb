//! Error types for the tisana client.

/// Errors returned by the tisana client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (connection, timeout, TLS).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error response.
    #[error("api error {status}: {code} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Whether the error is the idempotency conflict for an already granted
    /// award.
    #[must_use]
    pub fn is_duplicate_award(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "duplicate_award")
    }

    /// Whether the error reports insufficient points.
    #[must_use]
    pub fn is_insufficient_points(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "insufficient_points")
    }
}
