//! Account registration and profile handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use tisana_core::{TransactionType, UserAccount};
use tisana_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// The user ID.
    pub user_id: String,
    /// Current points balance.
    pub points_balance: i64,
    /// Lifetime points credited.
    pub lifetime_earned: i64,
    /// Lifetime points debited.
    pub lifetime_spent: i64,
    /// When the account was created.
    pub created_at: String,
}

impl From<&UserAccount> for AccountResponse {
    fn from(account: &UserAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            points_balance: account.points_balance,
            lifetime_earned: account.lifetime_earned,
            lifetime_spent: account.lifetime_spent,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Register the authenticated user's loyalty account.
///
/// The registration bonus is granted exactly once per user, guarded by a
/// marker, so a replayed registration request cannot double-award even if an
/// earlier attempt failed after the award.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    if state.store.get_account(&auth.user_id)?.is_some() {
        return Err(ApiError::Conflict("Account already exists".into()));
    }

    let account = UserAccount::new(auth.user_id);
    state.store.put_account(&account)?;

    let bonus = state.config.points.registration_bonus;
    if bonus > 0 {
        let marker = format!("registration:{}", auth.user_id);
        match state.store.adjust_points_once(
            &marker,
            &auth.user_id,
            bonus,
            TransactionType::RegistrationBonus,
            None,
            "Welcome bonus",
        ) {
            Ok(entry) => {
                tracing::info!(
                    user_id = %auth.user_id,
                    bonus = %bonus,
                    new_balance = %entry.points_after,
                    "Registration bonus awarded"
                );
            }
            Err(StoreError::DuplicateAward { .. }) => {
                tracing::debug!(user_id = %auth.user_id, "Registration bonus already awarded");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::Internal("Account vanished after creation".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}

/// Get the authenticated user's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}
