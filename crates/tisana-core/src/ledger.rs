//! Points ledger entry types for tisana.
//!
//! This module defines the append-only ledger rows that record every change
//! to a user's points balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, UserId};

/// One immutable points ledger row.
///
/// Every change to a user's balance appends exactly one entry. Entries carry
/// the balance before and after the change, captured at write time, so the
/// history doubles as an audit trail. Entry IDs are ULIDs for time-ordering.
///
/// Invariants, enforced at creation and checked by tests:
/// `points_after == points_before + points_change` and `points_after >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Signed change in points. Positive = credit, negative = debit.
    pub points_change: i64,

    /// Why the balance changed.
    pub transaction_type: TransactionType,

    /// Related external object, e.g. an order or product ID.
    pub reference_id: Option<String>,

    /// Balance before this entry.
    pub points_before: i64,

    /// Balance after this entry.
    pub points_after: i64,

    /// Human-readable note.
    pub notes: String,

    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl PointsEntry {
    /// Create a new ledger entry, deriving `points_after` from the before
    /// balance and the change.
    #[must_use]
    pub fn new(
        user_id: UserId,
        points_change: i64,
        transaction_type: TransactionType,
        reference_id: Option<String>,
        points_before: i64,
        notes: String,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            points_change,
            transaction_type,
            reference_id,
            points_before,
            points_after: points_before + points_change,
            notes,
            created_at: Utc::now(),
        }
    }

    /// Points earned from a completed purchase.
    #[must_use]
    pub fn purchase(user_id: UserId, earned: i64, points_before: i64, order_id: String) -> Self {
        Self::new(
            user_id,
            earned,
            TransactionType::Purchase,
            Some(order_id.clone()),
            points_before,
            format!("Points earned for order {order_id}"),
        )
    }

    /// Points spent paying for an order. The amount is always recorded as a
    /// debit regardless of the sign passed in.
    #[must_use]
    pub fn order_payment(
        user_id: UserId,
        amount: i64,
        points_before: i64,
        reference_id: String,
    ) -> Self {
        Self::new(
            user_id,
            -amount.abs(),
            TransactionType::OrderPayment,
            Some(reference_id),
            points_before,
            "Points payment".to_string(),
        )
    }

    /// Commission credited to a mix creator when their published mix sells.
    #[must_use]
    pub fn commission(user_id: UserId, amount: i64, points_before: i64, order_id: String) -> Self {
        Self::new(
            user_id,
            amount,
            TransactionType::MixSaleCommission,
            Some(order_id.clone()),
            points_before,
            format!("Sale commission for order {order_id}"),
        )
    }

    /// Flat bonus, e.g. for publishing a mix.
    #[must_use]
    pub fn bonus(user_id: UserId, amount: i64, points_before: i64, reason: String) -> Self {
        Self::new(
            user_id,
            amount,
            TransactionType::Bonus,
            None,
            points_before,
            reason,
        )
    }

    /// Refund of previously spent points.
    #[must_use]
    pub fn refund(user_id: UserId, amount: i64, points_before: i64, order_id: String) -> Self {
        Self::new(
            user_id,
            amount,
            TransactionType::Refund,
            Some(order_id.clone()),
            points_before,
            format!("Refund for order {order_id}"),
        )
    }

    /// One-time bonus on account registration.
    #[must_use]
    pub fn registration_bonus(user_id: UserId, amount: i64, points_before: i64) -> Self {
        Self::new(
            user_id,
            amount,
            TransactionType::RegistrationBonus,
            None,
            points_before,
            "Welcome bonus".to_string(),
        )
    }

    /// Bonus for reviewing a product.
    #[must_use]
    pub fn review_bonus(
        user_id: UserId,
        amount: i64,
        points_before: i64,
        product_id: String,
    ) -> Self {
        Self::new(
            user_id,
            amount,
            TransactionType::ReviewBonus,
            Some(product_id),
            points_before,
            "Review bonus".to_string(),
        )
    }

    /// Check the arithmetic invariants on this entry.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.points_after == self.points_before + self.points_change && self.points_after >= 0
    }
}

/// Why a points balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Points earned from a completed order.
    Purchase,

    /// Points spent paying for an order.
    OrderPayment,

    /// Commission credited to a mix creator on a sale.
    MixSaleCommission,

    /// Operator-initiated reconciliation entry.
    Manual,

    /// Single-user admin adjustment.
    AdminAdjustment,

    /// Promotional or publish bonus.
    Bonus,

    /// Refund of spent points.
    Refund,

    /// One-time registration bonus.
    RegistrationBonus,

    /// Bonus for reviewing a product.
    ReviewBonus,

    /// Per-user row of a bulk admin adjustment.
    BulkAdminAdjustment,
}

impl TransactionType {
    /// Whether this type always credits points.
    #[must_use]
    pub const fn is_earning(&self) -> bool {
        matches!(
            self,
            Self::Purchase
                | Self::MixSaleCommission
                | Self::Bonus
                | Self::Refund
                | Self::RegistrationBonus
                | Self::ReviewBonus
        )
    }

    /// Whether this type always debits points. Admin and manual entries carry
    /// their sign in the change itself.
    #[must_use]
    pub const fn is_spending(&self) -> bool {
        matches!(self, Self::OrderPayment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_derives_points_after() {
        let user_id = UserId::generate();
        let entry = PointsEntry::purchase(user_id, 120, 500, "order-1".into());

        assert_eq!(entry.points_change, 120);
        assert_eq!(entry.points_before, 500);
        assert_eq!(entry.points_after, 620);
        assert_eq!(entry.transaction_type, TransactionType::Purchase);
        assert!(entry.is_consistent());
    }

    #[test]
    fn order_payment_is_always_a_debit() {
        let user_id = UserId::generate();
        let entry = PointsEntry::order_payment(user_id, 500, 500, "prod-1".into());

        assert_eq!(entry.points_change, -500);
        assert_eq!(entry.points_after, 0);
        assert!(entry.is_consistent());

        // Sign of the input does not matter
        let entry = PointsEntry::order_payment(user_id, -200, 300, "prod-2".into());
        assert_eq!(entry.points_change, -200);
    }

    #[test]
    fn negative_after_balance_is_inconsistent() {
        let user_id = UserId::generate();
        let entry = PointsEntry::order_payment(user_id, 50, 20, "prod-3".into());
        assert_eq!(entry.points_after, -30);
        assert!(!entry.is_consistent());
    }

    #[test]
    fn transaction_type_direction() {
        assert!(TransactionType::Purchase.is_earning());
        assert!(TransactionType::MixSaleCommission.is_earning());
        assert!(TransactionType::RegistrationBonus.is_earning());
        assert!(TransactionType::ReviewBonus.is_earning());
        assert!(!TransactionType::OrderPayment.is_earning());

        assert!(TransactionType::OrderPayment.is_spending());
        assert!(!TransactionType::AdminAdjustment.is_spending());
        assert!(!TransactionType::BulkAdminAdjustment.is_earning());
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_string(&TransactionType::MixSaleCommission).unwrap();
        assert_eq!(json, "\"mix_sale_commission\"");
        let json = serde_json::to_string(&TransactionType::BulkAdminAdjustment).unwrap();
        assert_eq!(json, "\"bulk_admin_adjustment\"");
    }
}
