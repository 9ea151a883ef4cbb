//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding the binary keys
//! used in column families.

use tisana_core::{EntryId, IngredientId, MixId, PackagingId, ProductId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a ledger entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a user-entry index key.
///
/// Format: `user_id (16 bytes) || entry_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a user's ledger entries sort by time.
#[must_use]
pub fn user_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a prefix for iterating all ledger entries of a user.
#[must_use]
pub fn user_entries_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the entry ID from a user-entry index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_entry_id_from_user_key(key: &[u8]) -> EntryId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    EntryId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create an award marker key from a marker string.
#[must_use]
pub fn marker_key(marker: &str) -> Vec<u8> {
    marker.as_bytes().to_vec()
}

/// Create a mix key from a mix ID.
#[must_use]
pub fn mix_key(mix_id: &MixId) -> Vec<u8> {
    mix_id.as_bytes().to_vec()
}

/// Create a user-mix index key.
///
/// Format: `user_id (16 bytes) || mix_id (16 bytes)`
#[must_use]
pub fn user_mix_key(user_id: &UserId, mix_id: &MixId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(mix_id.as_bytes());
    key
}

/// Create a prefix for iterating all mixes of a user.
#[must_use]
pub fn user_mixes_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the mix ID from a user-mix index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_mix_id_from_user_key(key: &[u8]) -> MixId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    MixId::from_bytes(bytes)
}

/// Create an ingredient key from an ingredient ID.
#[must_use]
pub fn ingredient_key(ingredient_id: &IngredientId) -> Vec<u8> {
    ingredient_id.as_bytes().to_vec()
}

/// Create a packaging key from a packaging ID.
#[must_use]
pub fn packaging_key(packaging_id: &PackagingId) -> Vec<u8> {
    packaging_id.as_bytes().to_vec()
}

/// Create a product key from a product ID.
#[must_use]
pub fn product_key(product_id: &ProductId) -> Vec<u8> {
    product_id.as_bytes().to_vec()
}

/// Create a `(mix, buyer)` private-product index key.
///
/// Format: `mix_id (16 bytes) || buyer_id (16 bytes)`
#[must_use]
pub fn mix_buyer_key(mix_id: &MixId, buyer_id: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(mix_id.as_bytes());
    key.extend_from_slice(buyer_id.as_bytes());
    key
}
