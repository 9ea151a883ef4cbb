//! Error types for tisana.

use crate::ids::IdError;

/// Result type for tisana operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in tisana domain operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Insufficient points for the operation.
    #[error("insufficient points: balance={balance}, required={required}")]
    InsufficientPoints {
        /// Current balance in points.
        balance: i64,
        /// Required amount in points.
        required: i64,
    },

    /// Account not found.
    #[error("account not found: {user_id}")]
    AccountNotFound {
        /// The user ID that was not found.
        user_id: String,
    },

    /// Mix not found.
    #[error("mix not found: {mix_id}")]
    MixNotFound {
        /// The mix ID that was not found.
        mix_id: String,
    },

    /// The requester does not own the mix.
    #[error("mix {mix_id} is not owned by the requester")]
    NotOwner {
        /// The mix ID.
        mix_id: String,
    },

    /// A mix must contain at least one ingredient.
    #[error("mix has no ingredients")]
    EmptyMix,

    /// The selected packaging does not exist or is unavailable.
    #[error("packaging unavailable: {packaging_id}")]
    PackagingUnavailable {
        /// The packaging ID.
        packaging_id: String,
    },

    /// Total ingredient weight exceeds the packaging capacity.
    #[error("total weight {total}g exceeds capacity {capacity}g")]
    CapacityExceeded {
        /// Total ingredient weight in grams.
        total: u32,
        /// Packaging capacity in grams.
        capacity: u32,
    },

    /// An included ingredient must weigh at least one gram.
    #[error("ingredient weight must be at least 1 gram")]
    InvalidWeight,

    /// The mix is already published.
    #[error("mix already published: {mix_id}")]
    AlreadyPublished {
        /// The mix ID.
        mix_id: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
