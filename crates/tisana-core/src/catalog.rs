//! Catalog row types: ingredients and packagings.
//!
//! Catalog rows are read-only from the mix builder's perspective; the
//! storefront maintains them through the admin endpoints. All monetary values
//! are integer cents and all point rates are whole points, so accumulator
//! arithmetic stays exact.

use serde::{Deserialize, Serialize};

use crate::{IngredientId, PackagingId};

/// A blendable ingredient with per-gram rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient ID.
    pub id: IngredientId,

    /// Display name.
    pub name: String,

    /// Price per gram in cents.
    pub price_cents_per_gram: i64,

    /// Points cost per gram when paying with points.
    pub points_cost_per_gram: i64,

    /// Points earned per gram on purchase.
    pub points_earned_per_gram: i64,

    /// Whether the ingredient is currently in stock.
    pub in_stock: bool,

    /// Whether the ingredient is shown in the builder.
    pub visible: bool,
}

impl Ingredient {
    /// Whether the builder should offer this ingredient.
    ///
    /// Visibility gates the builder UI only; rows that still exist keep
    /// contributing to totals of previously saved mixes.
    #[must_use]
    pub const fn is_listed(&self) -> bool {
        self.in_stock && self.visible
    }
}

/// A packaging option with a capacity budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Packaging {
    /// Packaging ID.
    pub id: PackagingId,

    /// Display name.
    pub name: String,

    /// Maximum total ingredient weight this container holds, in grams.
    pub capacity_grams: u32,

    /// Flat price in cents.
    pub price_cents: i64,

    /// Flat points cost when paying with points.
    pub points_cost: i64,

    /// Flat points earned on purchase.
    pub points_earned: i64,

    /// Whether the packaging can currently be selected.
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chamomile() -> Ingredient {
        Ingredient {
            id: IngredientId::generate(),
            name: "Chamomile".into(),
            price_cents_per_gram: 15,
            points_cost_per_gram: 15,
            points_earned_per_gram: 2,
            in_stock: true,
            visible: true,
        }
    }

    #[test]
    fn listed_requires_stock_and_visibility() {
        let mut ingredient = chamomile();
        assert!(ingredient.is_listed());

        ingredient.in_stock = false;
        assert!(!ingredient.is_listed());

        ingredient.in_stock = true;
        ingredient.visible = false;
        assert!(!ingredient.is_listed());
    }
}
