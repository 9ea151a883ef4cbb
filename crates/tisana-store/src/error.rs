//! Error types for tisana storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed. A missing column family at open time also
    /// lands here: deployment drift fails loud rather than limping on.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// A one-time award was already granted (idempotency check failed).
    #[error("duplicate award: {marker}")]
    DuplicateAward {
        /// The marker that was already claimed.
        marker: String,
    },
}
