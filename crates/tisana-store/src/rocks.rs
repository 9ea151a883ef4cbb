//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use tisana_core::{
    EntryId, Ingredient, IngredientId, Mix, MixId, Packaging, PackagingId, PointsEntry, ProductId,
    ProductVisibility, ShopProduct, TransactionType, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{AwardMarker, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    // Serializes every read-modify-write of a balance so concurrent
    // adjustments cannot interleave between the read and the batch write.
    mutation_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            mutation_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The shared body of both adjust variants. Must be called with the
    /// mutation lock held.
    fn adjust_locked(
        &self,
        marker: Option<&str>,
        user_id: &UserId,
        delta: i64,
        transaction_type: TransactionType,
        reference_id: Option<String>,
        notes: &str,
    ) -> Result<PointsEntry> {
        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        let before = account.points_balance;
        // Debits clamp at zero; the caller owns the insufficient-balance
        // business rule. The entry records the change actually applied.
        let after = if delta < 0 {
            (before + delta).max(0)
        } else {
            before + delta
        };
        let applied = after - before;

        let entry = PointsEntry::new(
            *user_id,
            applied,
            transaction_type,
            reference_id,
            before,
            notes.to_string(),
        );

        account.points_balance = after;
        if applied > 0 {
            account.lifetime_earned += applied;
        } else {
            account.lifetime_spent += -applied;
        }
        account.updated_at = chrono::Utc::now();

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_by_user = self.cf(cf::LEDGER_BY_USER)?;

        let account_value = Self::serialize(&account)?;
        let entry_value = Self::serialize(&entry)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, keys::account_key(user_id), &account_value);
        batch.put_cf(&cf_ledger, keys::entry_key(&entry.id), &entry_value);
        batch.put_cf(&cf_by_user, keys::user_entry_key(user_id, &entry.id), []);

        if let Some(marker) = marker {
            let cf_markers = self.cf(cf::AWARD_MARKERS)?;
            let marker_value = Self::serialize(&AwardMarker::new(marker, notes))?;
            batch.put_cf(&cf_markers, keys::marker_key(marker), &marker_value);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(
            user_id = %user_id,
            delta = %delta,
            applied = %applied,
            new_balance = %after,
            "Points adjusted"
        );

        Ok(entry)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn put_account(&self, account: &tisana_core::UserAccount) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<tisana_core::UserAccount>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_account(&self, user_id: &UserId) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        if self.get_account(user_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<PointsEntry>> {
        let cf = self.cf(cf::LEDGER)?;
        let key = keys::entry_key(entry_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PointsEntry>> {
        let cf_by_user = self.cf(cf::LEDGER_BY_USER)?;
        let prefix = keys::user_entries_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect all matching keys first; ULIDs are naturally time-ordered,
        // so reversing gives newest-first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        all_keys.reverse();

        let mut entries = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if entries.len() >= limit {
                break;
            }

            let entry_id = keys::extract_entry_id_from_user_key(&key);
            if let Some(entry) = self.get_entry(&entry_id)? {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    // =========================================================================
    // Balance Mutation
    // =========================================================================

    fn adjust_points(
        &self,
        user_id: &UserId,
        delta: i64,
        transaction_type: TransactionType,
        reference_id: Option<String>,
        notes: &str,
    ) -> Result<PointsEntry> {
        let _guard = self.lock_mutations();
        self.adjust_locked(None, user_id, delta, transaction_type, reference_id, notes)
    }

    fn adjust_points_once(
        &self,
        marker: &str,
        user_id: &UserId,
        delta: i64,
        transaction_type: TransactionType,
        reference_id: Option<String>,
        notes: &str,
    ) -> Result<PointsEntry> {
        let _guard = self.lock_mutations();

        if self.has_marker(marker)? {
            return Err(StoreError::DuplicateAward {
                marker: marker.to_string(),
            });
        }

        self.adjust_locked(
            Some(marker),
            user_id,
            delta,
            transaction_type,
            reference_id,
            notes,
        )
    }

    fn try_claim_marker(&self, marker: &str, note: &str) -> Result<bool> {
        let _guard = self.lock_mutations();

        if self.has_marker(marker)? {
            return Ok(false);
        }

        let cf = self.cf(cf::AWARD_MARKERS)?;
        let value = Self::serialize(&AwardMarker::new(marker, note))?;
        self.db
            .put_cf(&cf, keys::marker_key(marker), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(true)
    }

    fn has_marker(&self, marker: &str) -> Result<bool> {
        let cf = self.cf(cf::AWARD_MARKERS)?;

        let exists = self
            .db
            .get_cf(&cf, keys::marker_key(marker))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        Ok(exists)
    }

    // =========================================================================
    // Mix Operations
    // =========================================================================

    fn put_mix(&self, mix: &Mix) -> Result<()> {
        let cf_mixes = self.cf(cf::MIXES)?;
        let cf_by_user = self.cf(cf::MIXES_BY_USER)?;

        let value = Self::serialize(mix)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_mixes, keys::mix_key(&mix.id), &value);
        batch.put_cf(&cf_by_user, keys::user_mix_key(&mix.user_id, &mix.id), []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_mix(&self, mix_id: &MixId) -> Result<Option<Mix>> {
        let cf = self.cf(cf::MIXES)?;

        self.db
            .get_cf(&cf, keys::mix_key(mix_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_mix(&self, mix_id: &MixId) -> Result<()> {
        let mix = self.get_mix(mix_id)?.ok_or(StoreError::NotFound)?;

        let cf_mixes = self.cf(cf::MIXES)?;
        let cf_by_user = self.cf(cf::MIXES_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_mixes, keys::mix_key(mix_id));
        batch.delete_cf(&cf_by_user, keys::user_mix_key(&mix.user_id, mix_id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_mixes_by_user(&self, user_id: &UserId) -> Result<Vec<Mix>> {
        let cf_by_user = self.cf(cf::MIXES_BY_USER)?;
        let prefix = keys::user_mixes_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut mixes = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let mix_id = keys::extract_mix_id_from_user_key(&key);
            if let Some(mix) = self.get_mix(&mix_id)? {
                mixes.push(mix);
            }
        }

        Ok(mixes)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    fn put_ingredient(&self, ingredient: &Ingredient) -> Result<()> {
        let cf = self.cf(cf::INGREDIENTS)?;
        let value = Self::serialize(ingredient)?;

        self.db
            .put_cf(&cf, keys::ingredient_key(&ingredient.id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_ingredient(&self, ingredient_id: &IngredientId) -> Result<Option<Ingredient>> {
        let cf = self.cf(cf::INGREDIENTS)?;

        self.db
            .get_cf(&cf, keys::ingredient_key(ingredient_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_ingredient(&self, ingredient_id: &IngredientId) -> Result<()> {
        if self.get_ingredient(ingredient_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let cf = self.cf(cf::INGREDIENTS)?;
        self.db
            .delete_cf(&cf, keys::ingredient_key(ingredient_id))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        let cf = self.cf(cf::INGREDIENTS)?;

        let mut ingredients = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            ingredients.push(Self::deserialize(&value)?);
        }

        Ok(ingredients)
    }

    fn put_packaging(&self, packaging: &Packaging) -> Result<()> {
        let cf = self.cf(cf::PACKAGINGS)?;
        let value = Self::serialize(packaging)?;

        self.db
            .put_cf(&cf, keys::packaging_key(&packaging.id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_packaging(&self, packaging_id: &PackagingId) -> Result<Option<Packaging>> {
        let cf = self.cf(cf::PACKAGINGS)?;

        self.db
            .get_cf(&cf, keys::packaging_key(packaging_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_packaging(&self, packaging_id: &PackagingId) -> Result<()> {
        if self.get_packaging(packaging_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let cf = self.cf(cf::PACKAGINGS)?;
        self.db
            .delete_cf(&cf, keys::packaging_key(packaging_id))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_packagings(&self) -> Result<Vec<Packaging>> {
        let cf = self.cf(cf::PACKAGINGS)?;

        let mut packagings = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            packagings.push(Self::deserialize(&value)?);
        }

        Ok(packagings)
    }

    // =========================================================================
    // Product Operations
    // =========================================================================

    fn put_product(&self, product: &ShopProduct) -> Result<()> {
        let cf_products = self.cf(cf::PRODUCTS)?;
        let value = Self::serialize(product)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_products, keys::product_key(&product.id), &value);

        // Private products are indexed by (mix, buyer) so a re-purchase
        // reuses the existing listing.
        if product.visibility == ProductVisibility::Private {
            if let Some(buyer_id) = &product.buyer_id {
                let cf_index = self.cf(cf::PRODUCTS_BY_MIX_BUYER)?;
                batch.put_cf(
                    &cf_index,
                    keys::mix_buyer_key(&product.mix_id, buyer_id),
                    product.id.as_bytes(),
                );
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_product(&self, product_id: &ProductId) -> Result<Option<ShopProduct>> {
        let cf = self.cf(cf::PRODUCTS)?;

        self.db
            .get_cf(&cf, keys::product_key(product_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_private_product(
        &self,
        mix_id: &MixId,
        buyer_id: &UserId,
    ) -> Result<Option<ShopProduct>> {
        let cf_index = self.cf(cf::PRODUCTS_BY_MIX_BUYER)?;

        let Some(id_bytes) = self
            .db
            .get_cf(&cf_index, keys::mix_buyer_key(mix_id, buyer_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        if id_bytes.len() != 16 {
            return Err(StoreError::Database(
                "corrupt product index entry".to_string(),
            ));
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&id_bytes);
        let product_id = ProductId::from_bytes(bytes);

        self.get_product(&product_id)
    }
}
