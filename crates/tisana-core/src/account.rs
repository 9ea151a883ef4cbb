//! User account types for tisana.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A loyalty account for a user.
///
/// The account carries the denormalized points balance. The balance must
/// always equal the `points_after` of the user's most recent ledger entry;
/// the system trusts this scalar and never recomputes it by summing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// The user ID.
    pub user_id: UserId,

    /// Current points balance. Never negative.
    pub points_balance: i64,

    /// Lifetime points credited.
    pub lifetime_earned: i64,

    /// Lifetime points debited.
    pub lifetime_spent: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            points_balance: 0,
            lifetime_earned: 0,
            lifetime_spent: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account can cover a debit of `required` points.
    #[must_use]
    pub const fn has_sufficient_points(&self, required: i64) -> bool {
        self.points_balance >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_zero_balance() {
        let account = UserAccount::new(UserId::generate());
        assert_eq!(account.points_balance, 0);
        assert_eq!(account.lifetime_earned, 0);
        assert_eq!(account.lifetime_spent, 0);
    }

    #[test]
    fn sufficient_points_boundary() {
        let mut account = UserAccount::new(UserId::generate());
        account.points_balance = 500;

        assert!(account.has_sufficient_points(499));
        assert!(account.has_sufficient_points(500));
        assert!(!account.has_sufficient_points(501));
    }
}
