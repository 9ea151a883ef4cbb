//! Points balance, history and admin adjustment handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tisana_core::{PointsEntry, TransactionType, UserId};
use tisana_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current points balance.
    pub points_balance: i64,
}

/// Get the authenticated user's current points balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(BalanceResponse {
        points_balance: account.points_balance,
    }))
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of entries to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// One ledger entry in a history response.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry ID.
    pub id: String,
    /// Signed change in points.
    pub points_change: i64,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Related external object, if any.
    pub reference_id: Option<String>,
    /// Balance before this entry.
    pub points_before: i64,
    /// Balance after this entry.
    pub points_after: i64,
    /// Human-readable note.
    pub notes: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&PointsEntry> for EntryResponse {
    fn from(entry: &PointsEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            points_change: entry.points_change,
            transaction_type: entry.transaction_type,
            reference_id: entry.reference_id.clone(),
            points_before: entry.points_before,
            points_after: entry.points_after,
            notes: entry.notes.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// History response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Ledger entries, newest first.
    pub entries: Vec<EntryResponse>,
    /// Whether there are more entries.
    pub has_more: bool,
}

/// List the authenticated user's points history, newest first.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let entries = state
        .store
        .list_entries_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = entries.len() > limit;
    let entries: Vec<_> = entries.iter().take(limit).map(EntryResponse::from).collect();

    Ok(Json(HistoryResponse { entries, has_more }))
}

/// Admin adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// User ID to adjust.
    pub user_id: String,
    /// Signed points change.
    pub points_change: i64,
    /// Reason recorded in the ledger.
    pub reason: String,
    /// Related external object, if any.
    pub reference_id: Option<String>,
    /// Record the entry as an operator reconciliation instead of a plain
    /// admin adjustment.
    #[serde(default)]
    pub manual: bool,
}

/// Adjustment response.
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    /// New balance after the adjustment.
    pub points_balance: i64,
    /// The appended ledger entry ID.
    pub entry_id: String,
    /// The change actually applied (debits clamp at zero).
    pub points_change: i64,
}

/// Admin endpoint to adjust a single user's balance.
pub async fn admin_adjust(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    let user_id: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let transaction_type = if body.manual {
        TransactionType::Manual
    } else {
        TransactionType::AdminAdjustment
    };

    let entry = state.store.adjust_points(
        &user_id,
        body.points_change,
        transaction_type,
        body.reference_id,
        &body.reason,
    )?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %user_id,
        points_change = %body.points_change,
        applied = %entry.points_change,
        new_balance = %entry.points_after,
        reason = %body.reason,
        "Admin points adjustment"
    );

    Ok(Json(AdjustResponse {
        points_balance: entry.points_after,
        entry_id: entry.id.to_string(),
        points_change: entry.points_change,
    }))
}

/// Bulk adjustment request.
#[derive(Debug, Deserialize)]
pub struct BulkAdjustRequest {
    /// User IDs to adjust.
    pub user_ids: Vec<String>,
    /// Signed points change applied to every user.
    pub points_change: i64,
    /// Reason recorded in each ledger entry.
    pub reason: String,
}

/// Result for one user in a bulk adjustment.
#[derive(Debug, Serialize)]
pub struct BulkAdjustResult {
    /// The user ID.
    pub user_id: String,
    /// Whether the adjustment succeeded.
    pub success: bool,
    /// New balance, if successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_balance: Option<i64>,
    /// Error message, if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bulk adjustment response.
#[derive(Debug, Serialize)]
pub struct BulkAdjustResponse {
    /// Per-user results.
    pub results: Vec<BulkAdjustResult>,
    /// Users adjusted.
    pub adjusted: usize,
    /// Users failed.
    pub failed: usize,
}

/// Admin endpoint to adjust many balances at once.
///
/// Each user is adjusted independently; a failure for one user does not roll
/// back the others.
pub async fn bulk_adjust(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<BulkAdjustRequest>,
) -> Result<Json<BulkAdjustResponse>, ApiError> {
    let mut results = Vec::with_capacity(body.user_ids.len());
    let mut adjusted = 0;
    let mut failed = 0;

    for raw_id in &body.user_ids {
        let outcome = raw_id
            .parse::<UserId>()
            .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))
            .and_then(|user_id| {
                state
                    .store
                    .adjust_points(
                        &user_id,
                        body.points_change,
                        TransactionType::BulkAdminAdjustment,
                        None,
                        &body.reason,
                    )
                    .map_err(ApiError::from)
            });

        match outcome {
            Ok(entry) => {
                adjusted += 1;
                results.push(BulkAdjustResult {
                    user_id: raw_id.clone(),
                    success: true,
                    points_balance: Some(entry.points_after),
                    error: None,
                });
            }
            Err(e) => {
                failed += 1;
                results.push(BulkAdjustResult {
                    user_id: raw_id.clone(),
                    success: false,
                    points_balance: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    tracing::info!(
        service = %auth.service_name,
        points_change = %body.points_change,
        adjusted = %adjusted,
        failed = %failed,
        "Bulk points adjustment"
    );

    Ok(Json(BulkAdjustResponse {
        results,
        adjusted,
        failed,
    }))
}

/// Check points request.
#[derive(Debug, Deserialize)]
pub struct CheckPointsRequest {
    /// User ID to check.
    pub user_id: String,
    /// Required amount in points.
    pub required: i64,
}

/// Check points response.
#[derive(Debug, Serialize)]
pub struct CheckPointsResponse {
    /// Whether the user has sufficient balance.
    pub sufficient: bool,
    /// Current balance.
    pub points_balance: i64,
    /// Required amount.
    pub required: i64,
}

/// Check whether a user can cover a points payment.
pub async fn check_points(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<CheckPointsRequest>,
) -> Result<Json<CheckPointsResponse>, ApiError> {
    let user_id: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let account = state
        .store
        .get_account(&user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(CheckPointsResponse {
        sufficient: account.has_sufficient_points(body.required),
        points_balance: account.points_balance,
        required: body.required,
    }))
}
