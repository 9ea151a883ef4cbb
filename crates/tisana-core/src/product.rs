//! Shop product records produced for the storefront.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mix::Mix;
use crate::totals::MixTotals;
use crate::{MixId, ProductId, UserId};

/// A catalog listing generated from a mix.
///
/// Publishing creates one public product per mix; purchasing creates (or
/// reuses) one private product per `(mix, buyer)` pair. Price and point
/// values are snapshots of the accumulator totals at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopProduct {
    /// Product ID.
    pub id: ProductId,

    /// The mix this product was generated from.
    pub mix_id: MixId,

    /// The mix creator.
    pub creator_id: UserId,

    /// The buyer a private product was created for; `None` for public
    /// listings.
    pub buyer_id: Option<UserId>,

    /// Public or private listing.
    pub visibility: ProductVisibility,

    /// Price snapshot in cents.
    pub price_cents: i64,

    /// Points cost snapshot.
    pub points_cost: i64,

    /// Points earned snapshot.
    pub points_earned: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Product listing visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductVisibility {
    /// Publicly purchasable listing.
    Public,

    /// Per-buyer listing created on demand.
    Private,
}

impl ShopProduct {
    /// Create the public listing for a published mix.
    #[must_use]
    pub fn public_listing(mix: &Mix, totals: MixTotals) -> Self {
        Self {
            id: ProductId::generate(),
            mix_id: mix.id,
            creator_id: mix.user_id,
            buyer_id: None,
            visibility: ProductVisibility::Public,
            price_cents: totals.price_cents,
            points_cost: totals.points_cost,
            points_earned: totals.points_earned,
            created_at: Utc::now(),
        }
    }

    /// Create the private per-buyer copy for a purchase.
    #[must_use]
    pub fn private_copy(mix: &Mix, buyer_id: UserId, totals: MixTotals) -> Self {
        Self {
            id: ProductId::generate(),
            mix_id: mix.id,
            creator_id: mix.user_id,
            buyer_id: Some(buyer_id),
            visibility: ProductVisibility::Private,
            price_cents: totals.price_cents,
            points_cost: totals.points_cost,
            points_earned: totals.points_earned,
            created_at: Utc::now(),
        }
    }

    /// Whether a sale of this product pays commission to someone other than
    /// the buyer.
    #[must_use]
    pub fn commission_eligible(&self, buyer: &UserId) -> bool {
        self.visibility == ProductVisibility::Public && self.creator_id != *buyer
    }
}
