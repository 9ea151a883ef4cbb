//! The points accumulator: price and point totals for a mix.
//!
//! Totals are always computed from *current* catalog rows; client-submitted
//! prices are never ingested. All arithmetic is integer (cents and whole
//! points), so sums are exact.

use serde::{Deserialize, Serialize};

use crate::catalog::{Ingredient, Packaging};
use crate::mix::MixComposition;
use crate::IngredientId;

/// Price and point totals for one mix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixTotals {
    /// Total price in cents.
    pub price_cents: i64,

    /// Total points cost when paying with points.
    pub points_cost: i64,

    /// Total points earned on purchase.
    pub points_earned: i64,
}

impl MixTotals {
    /// Format the price as dollars for display.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn price_formatted(&self) -> String {
        format!("${:.2}", self.price_cents as f64 / 100.0)
    }
}

/// Compute the totals of a composition against current catalog rows.
///
/// `packaging` and the rows returned by `lookup` are the catalog as it is
/// *now*. A missing packaging or ingredient row is skipped silently: its term
/// drops out of all three totals without raising an error. This tolerance
/// keeps historical mixes priceable after a catalog deletion, at the cost of
/// their totals silently shrinking.
pub fn compute_totals<F>(
    composition: &MixComposition,
    packaging: Option<&Packaging>,
    lookup: F,
) -> MixTotals
where
    F: Fn(&IngredientId) -> Option<Ingredient>,
{
    let mut totals = MixTotals::default();

    if let Some(packaging) = packaging {
        totals.price_cents += packaging.price_cents;
        totals.points_cost += packaging.points_cost;
        totals.points_earned += packaging.points_earned;
    }

    for item in &composition.items {
        let Some(ingredient) = lookup(&item.ingredient_id) else {
            continue;
        };
        let grams = i64::from(item.weight_grams);
        totals.price_cents += ingredient.price_cents_per_gram * grams;
        totals.points_cost += ingredient.points_cost_per_gram * grams;
        totals.points_earned += ingredient.points_earned_per_gram * grams;
    }

    totals
}

/// Round-half-up integer percentage, used for sale commissions.
///
/// `earned` must be non-negative; percentages are whole percents.
#[must_use]
pub fn commission_points(earned: i64, percent: u8) -> i64 {
    (earned * i64::from(percent) + 50) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mix::MixItem;
    use crate::{PackagingId, UserId};
    use std::collections::HashMap;

    fn packaging(price_cents: i64, points_cost: i64, points_earned: i64) -> Packaging {
        Packaging {
            id: PackagingId::generate(),
            name: "Tin 100g".into(),
            capacity_grams: 100,
            price_cents,
            points_cost,
            points_earned,
            available: true,
        }
    }

    fn ingredient(price: i64, cost: i64, earned: i64) -> Ingredient {
        Ingredient {
            id: IngredientId::generate(),
            name: "Hibiscus".into(),
            price_cents_per_gram: price,
            points_cost_per_gram: cost,
            points_earned_per_gram: earned,
            in_stock: true,
            visible: true,
        }
    }

    #[test]
    fn hand_computed_totals() {
        // Packaging $2.00 / 200 points cost / 20 earned, plus 50g of an
        // ingredient at $0.15/g, 15 points/g cost, 2 points/g earned:
        // price $9.50, cost 950, earned 120.
        let packaging = packaging(200, 200, 20);
        let ingredient = ingredient(15, 15, 2);
        let mut catalog = HashMap::new();
        catalog.insert(ingredient.id, ingredient.clone());

        let composition = MixComposition {
            packaging_id: packaging.id,
            items: vec![MixItem {
                ingredient_id: ingredient.id,
                weight_grams: 50,
            }],
        };

        let totals = compute_totals(&composition, Some(&packaging), |id| {
            catalog.get(id).cloned()
        });

        assert_eq!(totals.price_cents, 950);
        assert_eq!(totals.points_cost, 950);
        assert_eq!(totals.points_earned, 120);
        assert_eq!(totals.price_formatted(), "$9.50");
    }

    #[test]
    fn deleted_ingredient_drops_out_silently() {
        let packaging = packaging(200, 200, 20);
        let kept = ingredient(15, 15, 2);
        let deleted_id = IngredientId::generate();
        let mut catalog = HashMap::new();
        catalog.insert(kept.id, kept.clone());

        let composition = MixComposition {
            packaging_id: packaging.id,
            items: vec![
                MixItem {
                    ingredient_id: kept.id,
                    weight_grams: 50,
                },
                MixItem {
                    ingredient_id: deleted_id,
                    weight_grams: 30,
                },
            ],
        };

        let totals = compute_totals(&composition, Some(&packaging), |id| {
            catalog.get(id).cloned()
        });

        // Only the surviving ingredient and the packaging contribute.
        assert_eq!(totals.price_cents, 950);
        assert_eq!(totals.points_earned, 120);
    }

    #[test]
    fn missing_packaging_drops_out_silently() {
        let ingredient = ingredient(10, 10, 1);
        let mut catalog = HashMap::new();
        catalog.insert(ingredient.id, ingredient.clone());

        let composition = MixComposition {
            packaging_id: PackagingId::generate(),
            items: vec![MixItem {
                ingredient_id: ingredient.id,
                weight_grams: 20,
            }],
        };

        let totals = compute_totals(&composition, None, |id| catalog.get(id).cloned());
        assert_eq!(totals.price_cents, 200);
        assert_eq!(totals.points_cost, 200);
        assert_eq!(totals.points_earned, 20);
    }

    #[test]
    fn empty_composition_totals_to_packaging_only() {
        let packaging = packaging(300, 300, 30);
        let composition = MixComposition::new(packaging.id);
        let totals = compute_totals(&composition, Some(&packaging), |_| None);
        assert_eq!(totals.price_cents, 300);
    }

    #[test]
    fn commission_rounds_half_up() {
        assert_eq!(commission_points(120, 10), 12);
        assert_eq!(commission_points(125, 10), 13); // 12.5 rounds up
        assert_eq!(commission_points(124, 10), 12); // 12.4 rounds down
        assert_eq!(commission_points(0, 10), 0);
        assert_eq!(commission_points(5, 10), 1); // 0.5 rounds up
    }
}
