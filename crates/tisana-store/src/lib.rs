//! `RocksDB` storage layer for tisana.
//!
//! This crate provides persistent storage for user accounts, the points
//! ledger, mixes, catalog rows and shop products using `RocksDB` with column
//! families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: User accounts (denormalized balance), keyed by `user_id`
//! - `ledger`: Points ledger entries, keyed by `entry_id` (ULID)
//! - `ledger_by_user`: Index for listing a user's entries newest-first
//! - `award_markers`: Idempotency markers for one-time awards
//! - `mixes` / `mixes_by_user`: Mix records and owner index
//! - `ingredients` / `packagings`: Catalog rows
//! - `products` / `products_by_mix_buyer`: Shop products and the
//!   private-product reuse index
//!
//! # Balance consistency
//!
//! The balance mutator writes the updated account and the appended ledger
//! entry in a single `WriteBatch`, and the read-modify-write cycle holds a
//! store-wide mutation lock, so the cached balance and the newest ledger
//! entry cannot diverge under concurrent adjustments.
//!
//! # Example
//!
//! ```no_run
//! use tisana_store::{RocksStore, Store};
//! use tisana_core::{UserAccount, UserId, TransactionType};
//!
//! let store = RocksStore::open("/tmp/tisana-db").unwrap();
//!
//! let user_id = UserId::generate();
//! store.put_account(&UserAccount::new(user_id)).unwrap();
//!
//! let entry = store
//!     .adjust_points(&user_id, 100, TransactionType::Bonus, None, "welcome")
//!     .unwrap();
//! assert_eq!(entry.points_after, 100);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tisana_core::{
    EntryId, Ingredient, IngredientId, Mix, MixId, Packaging, PackagingId, PointsEntry, ProductId,
    ShopProduct, TransactionType, UserAccount, UserId,
};

/// A claimed one-time award marker.
///
/// Markers make award paths idempotent: `order:{order_id}`,
/// `publish:{mix_id}`, `registration:{user_id}`,
/// `review:{user_id}:{product_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardMarker {
    /// The marker string.
    pub marker: String,

    /// What claimed it.
    pub note: String,

    /// When it was claimed.
    pub created_at: DateTime<Utc>,
}

impl AwardMarker {
    /// Create a marker claimed now.
    #[must_use]
    pub fn new(marker: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            note: note.into(),
            created_at: Utc::now(),
        }
    }
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &UserAccount) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<UserAccount>>;

    /// Delete an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn delete_account(&self, user_id: &UserId) -> Result<()>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<PointsEntry>>;

    /// List a user's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PointsEntry>>;

    // =========================================================================
    // Balance Mutation
    // =========================================================================

    /// Adjust a user's balance and append the ledger entry atomically.
    ///
    /// Debits clamp the resulting balance at zero; the recorded
    /// `points_change` is the change actually applied. Enforcing an
    /// insufficient-balance business rule is the caller's responsibility.
    ///
    /// Returns the appended entry (whose `points_after` is the new balance).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn adjust_points(
        &self,
        user_id: &UserId,
        delta: i64,
        transaction_type: TransactionType,
        reference_id: Option<String>,
        notes: &str,
    ) -> Result<PointsEntry>;

    /// Like [`adjust_points`](Self::adjust_points), but claims `marker` in
    /// the same write batch so the award happens at most once.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateAward` if the marker was already claimed.
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn adjust_points_once(
        &self,
        marker: &str,
        user_id: &UserId,
        delta: i64,
        transaction_type: TransactionType,
        reference_id: Option<String>,
        notes: &str,
    ) -> Result<PointsEntry>;

    /// Claim a marker without adjusting a balance. Returns `false` if it was
    /// already claimed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn try_claim_marker(&self, marker: &str, note: &str) -> Result<bool>;

    /// Check whether a marker has been claimed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_marker(&self, marker: &str) -> Result<bool>;

    // =========================================================================
    // Mix Operations
    // =========================================================================

    /// Insert or update a mix (also maintains the owner index).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_mix(&self, mix: &Mix) -> Result<()>;

    /// Get a mix by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_mix(&self, mix_id: &MixId) -> Result<Option<Mix>>;

    /// Delete a mix and its owner-index row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the mix doesn't exist.
    fn delete_mix(&self, mix_id: &MixId) -> Result<()>;

    /// List all mixes owned by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_mixes_by_user(&self, user_id: &UserId) -> Result<Vec<Mix>>;

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Insert or update an ingredient row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_ingredient(&self, ingredient: &Ingredient) -> Result<()>;

    /// Get an ingredient by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_ingredient(&self, ingredient_id: &IngredientId) -> Result<Option<Ingredient>>;

    /// Delete an ingredient row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the ingredient doesn't exist.
    fn delete_ingredient(&self, ingredient_id: &IngredientId) -> Result<()>;

    /// List all ingredient rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_ingredients(&self) -> Result<Vec<Ingredient>>;

    /// Insert or update a packaging row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_packaging(&self, packaging: &Packaging) -> Result<()>;

    /// Get a packaging by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_packaging(&self, packaging_id: &PackagingId) -> Result<Option<Packaging>>;

    /// Delete a packaging row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the packaging doesn't exist.
    fn delete_packaging(&self, packaging_id: &PackagingId) -> Result<()>;

    /// List all packaging rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_packagings(&self) -> Result<Vec<Packaging>>;

    // =========================================================================
    // Product Operations
    // =========================================================================

    /// Insert or update a shop product (also maintains the `(mix, buyer)`
    /// index for private products).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_product(&self, product: &ShopProduct) -> Result<()>;

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_product(&self, product_id: &ProductId) -> Result<Option<ShopProduct>>;

    /// Look up the existing private product for a `(mix, buyer)` pair, if
    /// one was already created for an earlier purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_private_product(
        &self,
        mix_id: &MixId,
        buyer_id: &UserId,
    ) -> Result<Option<ShopProduct>>;
}
