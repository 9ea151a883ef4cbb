//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User accounts with the denormalized points balance, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Points ledger entries, keyed by `entry_id` (ULID).
    pub const LEDGER: &str = "ledger";

    /// Index: ledger entries by user, keyed by `user_id || entry_id`.
    /// Value is empty (index only).
    pub const LEDGER_BY_USER: &str = "ledger_by_user";

    /// Idempotency markers for one-time awards, keyed by marker string.
    pub const AWARD_MARKERS: &str = "award_markers";

    /// Mix records, keyed by `mix_id`.
    pub const MIXES: &str = "mixes";

    /// Index: mixes by owner, keyed by `user_id || mix_id`.
    pub const MIXES_BY_USER: &str = "mixes_by_user";

    /// Catalog ingredients, keyed by `ingredient_id`.
    pub const INGREDIENTS: &str = "ingredients";

    /// Catalog packagings, keyed by `packaging_id`.
    pub const PACKAGINGS: &str = "packagings";

    /// Shop products, keyed by `product_id`.
    pub const PRODUCTS: &str = "products";

    /// Index: private products by `(mix, buyer)`, keyed by
    /// `mix_id || buyer_id`. Value is the product ID (16 bytes).
    pub const PRODUCTS_BY_MIX_BUYER: &str = "products_by_mix_buyer";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::LEDGER,
        cf::LEDGER_BY_USER,
        cf::AWARD_MARKERS,
        cf::MIXES,
        cf::MIXES_BY_USER,
        cf::INGREDIENTS,
        cf::PACKAGINGS,
        cf::PRODUCTS,
        cf::PRODUCTS_BY_MIX_BUYER,
    ]
}
