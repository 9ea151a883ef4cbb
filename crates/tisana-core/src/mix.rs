//! Mix types: composition, capacity clamping and the lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{IngredientId, MixId, PackagingId, ProductId, UserId};

/// A user-composed blend of ingredients in a chosen packaging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mix {
    /// Mix ID.
    pub id: MixId,

    /// The creating (and owning) user.
    pub user_id: UserId,

    /// Display name.
    pub name: String,

    /// Short description.
    pub description: String,

    /// The story shown on the product page of a published mix.
    pub story: String,

    /// Optional image reference (attachment URL or key).
    pub image: Option<String>,

    /// Packaging choice and weighted ingredient list.
    pub composition: MixComposition,

    /// Lifecycle status.
    pub status: MixStatus,

    /// Display-only like counter. Best-effort; losing an increment is not an
    /// error condition.
    pub like_count: u64,

    /// Public shop product created when the mix was published.
    pub published_product_id: Option<ProductId>,

    /// When the mix was created.
    pub created_at: DateTime<Utc>,
}

impl Mix {
    /// Create a new mix owned by `user_id`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        name: String,
        description: String,
        story: String,
        image: Option<String>,
        composition: MixComposition,
        status: MixStatus,
    ) -> Self {
        Self {
            id: MixId::generate(),
            user_id,
            name,
            description,
            story,
            image,
            composition,
            status,
            like_count: 0,
            published_product_id: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the mix has been promoted to a public catalog listing.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        matches!(self.status, MixStatus::Published)
    }

    /// Whether `user` owns this mix.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.user_id == *user
    }

    /// Transition `Favorite -> Published`, recording the public product.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPublished` if the mix is already published; publishing
    /// is one-way and only favorites can be promoted.
    pub fn publish(&mut self, product_id: ProductId) -> Result<()> {
        match self.status {
            MixStatus::Published => Err(CoreError::AlreadyPublished {
                mix_id: self.id.to_string(),
            }),
            MixStatus::Favorite | MixStatus::Private => {
                self.status = MixStatus::Published;
                self.published_product_id = Some(product_id);
                Ok(())
            }
        }
    }
}

/// Lifecycle status of a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStatus {
    /// Private to the owner, listed among their favorites.
    Favorite,

    /// Promoted to a publicly purchasable catalog listing.
    Published,

    /// Private to the owner, composed for direct purchase and omitted from
    /// the favorites listing.
    Private,
}

/// One weighted ingredient in a mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixItem {
    /// The catalog ingredient.
    pub ingredient_id: IngredientId,

    /// Weight in whole grams, at least 1.
    pub weight_grams: u32,
}

/// Packaging choice plus weighted ingredient list.
///
/// This is the JSON blob persisted with the mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixComposition {
    /// The selected packaging.
    pub packaging_id: PackagingId,

    /// Weighted ingredients.
    pub items: Vec<MixItem>,
}

/// Outcome of a single weight edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightApplied {
    /// The weight the caller asked for.
    pub requested: u32,

    /// The weight actually stored after capacity clamping.
    pub applied: u32,

    /// Whether the edit was clamped down.
    pub clamped: bool,
}

impl MixComposition {
    /// Create a composition with no ingredients yet.
    #[must_use]
    pub const fn new(packaging_id: PackagingId) -> Self {
        Self {
            packaging_id,
            items: Vec::new(),
        }
    }

    /// Sum of all ingredient weights in grams.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.items.iter().map(|item| item.weight_grams).sum()
    }

    /// Set (or add) one ingredient's weight, clamping against capacity.
    ///
    /// If the hypothetical new total would exceed `capacity_grams`, only the
    /// edited ingredient is adjusted down to the maximum weight that keeps
    /// the total at capacity; all other ingredients are left untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidWeight` if `grams` is zero; an included ingredient weighs at
    ///   least 1g, use [`remove_ingredient`](Self::remove_ingredient) instead.
    /// - `CapacityExceeded` if the other ingredients already fill the
    ///   packaging, so not even 1g of the edited ingredient fits.
    pub fn set_weight(
        &mut self,
        ingredient_id: IngredientId,
        grams: u32,
        capacity_grams: u32,
    ) -> Result<WeightApplied> {
        if grams == 0 {
            return Err(CoreError::InvalidWeight);
        }

        let other_total: u32 = self
            .items
            .iter()
            .filter(|item| item.ingredient_id != ingredient_id)
            .map(|item| item.weight_grams)
            .sum();

        let room = capacity_grams.saturating_sub(other_total);
        if room == 0 {
            return Err(CoreError::CapacityExceeded {
                total: other_total + grams,
                capacity: capacity_grams,
            });
        }

        let applied = grams.min(room);
        match self
            .items
            .iter_mut()
            .find(|item| item.ingredient_id == ingredient_id)
        {
            Some(item) => item.weight_grams = applied,
            None => self.items.push(MixItem {
                ingredient_id,
                weight_grams: applied,
            }),
        }

        Ok(WeightApplied {
            requested: grams,
            applied,
            clamped: applied < grams,
        })
    }

    /// Remove an ingredient from the mix. Returns whether it was present.
    pub fn remove_ingredient(&mut self, ingredient_id: &IngredientId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.ingredient_id != *ingredient_id);
        self.items.len() != before
    }

    /// Save-time validation: at least one ingredient, every weight at least
    /// 1g, total within capacity.
    ///
    /// # Errors
    ///
    /// Returns `EmptyMix`, `InvalidWeight` or `CapacityExceeded` accordingly.
    pub fn validate(&self, capacity_grams: u32) -> Result<()> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyMix);
        }
        if self.items.iter().any(|item| item.weight_grams == 0) {
            return Err(CoreError::InvalidWeight);
        }
        let total = self.total_weight();
        if total > capacity_grams {
            return Err(CoreError::CapacityExceeded {
                total,
                capacity: capacity_grams,
            });
        }
        Ok(())
    }
}
