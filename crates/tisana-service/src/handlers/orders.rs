//! Order lifecycle handlers: completion awards and refunds.
//!
//! Completion events arrive either from the storefront backend with service
//! auth, or as signed webhooks. Awards are idempotent per order: replaying a
//! completion is a no-op success.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use tisana_core::{commission_points, ShopProduct, TransactionType, UserId};
use tisana_store::{Store, StoreError};

use crate::auth::ServiceAuth;
use crate::crypto::verify_order_signature;
use crate::error::ApiError;
use crate::state::AppState;

/// One line of a completed order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    /// The purchased product.
    pub product_id: String,
    /// Quantity purchased.
    pub quantity: u32,
}

/// Order completion request.
#[derive(Debug, Deserialize)]
pub struct CompleteOrderRequest {
    /// The storefront order ID.
    pub order_id: String,
    /// The buyer.
    pub user_id: String,
    /// Purchased lines.
    pub lines: Vec<OrderLine>,
}

/// Commission granted to one creator.
#[derive(Debug, Serialize)]
pub struct CommissionGrant {
    /// The creator credited.
    pub user_id: String,
    /// Points credited.
    pub points: i64,
}

/// Order completion response.
#[derive(Debug, Serialize)]
pub struct CompleteOrderResponse {
    /// Whether this order had already been processed (no-op).
    pub already_processed: bool,
    /// Points awarded to the buyer by this request.
    pub points_awarded: i64,
    /// Commissions credited to mix creators by this request.
    pub commissions: Vec<CommissionGrant>,
}

/// Award points for a completed order (service auth).
pub async fn complete_order(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<CompleteOrderRequest>,
) -> Result<Json<CompleteOrderResponse>, ApiError> {
    tracing::debug!(
        service = %auth.service_name,
        order_id = %body.order_id,
        lines = %body.lines.len(),
        "Processing order completion"
    );

    let response = process_completion(&state, body)?;
    Ok(Json(response))
}

/// Signed order webhook from the storefront.
///
/// The body is HMAC-SHA256 signed with the shared webhook secret; when no
/// secret is configured the signature check is skipped (development mode).
pub async fn order_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<CompleteOrderResponse>, ApiError> {
    if let Some(secret) = &state.config.order_webhook_secret {
        let signature = headers
            .get("x-tisana-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing order signature".into()))?;

        verify_order_signature(&body, signature, secret).map_err(|e| {
            tracing::warn!(error = %e, "Invalid order webhook signature");
            ApiError::BadRequest("Invalid webhook signature".into())
        })?;
    } else {
        tracing::warn!("Order webhook secret not configured - skipping signature verification");
    }

    let request: CompleteOrderRequest =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(order_id = %request.order_id, "Received order webhook");

    let response = process_completion(&state, request)?;
    Ok(Json(response))
}

/// The shared completion path: resolve lines against stored products, award
/// the buyer once, then credit creator commissions.
fn process_completion(
    state: &AppState,
    body: CompleteOrderRequest,
) -> Result<CompleteOrderResponse, ApiError> {
    let buyer: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    // Resolve lines against stored product snapshots. A product deleted
    // since the order was placed drops out silently.
    let mut resolved: Vec<(ShopProduct, u32)> = Vec::new();
    for line in &body.lines {
        let product_id = line
            .product_id
            .parse()
            .map_err(|_| ApiError::BadRequest("Invalid product ID".into()))?;

        match state.store.get_product(&product_id)? {
            Some(product) => resolved.push((product, line.quantity)),
            None => {
                tracing::debug!(
                    product_id = %line.product_id,
                    order_id = %body.order_id,
                    "Product missing from catalog, skipping its award"
                );
            }
        }
    }

    let total_earned: i64 = resolved
        .iter()
        .map(|(product, quantity)| product.points_earned * i64::from(*quantity))
        .sum();

    // One award per order: the marker claim and the buyer credit share a
    // write batch.
    let marker = format!("order:{}", body.order_id);
    if total_earned > 0 {
        match state.store.adjust_points_once(
            &marker,
            &buyer,
            total_earned,
            TransactionType::Purchase,
            Some(body.order_id.clone()),
            &format!("Points earned for order {}", body.order_id),
        ) {
            Ok(entry) => {
                tracing::info!(
                    order_id = %body.order_id,
                    user_id = %buyer,
                    points = %total_earned,
                    new_balance = %entry.points_after,
                    "Order points awarded"
                );
            }
            Err(StoreError::DuplicateAward { .. }) => {
                return Ok(CompleteOrderResponse {
                    already_processed: true,
                    points_awarded: 0,
                    commissions: Vec::new(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    } else if !state.store.try_claim_marker(&marker, "order with no earnable lines")? {
        return Ok(CompleteOrderResponse {
            already_processed: true,
            points_awarded: 0,
            commissions: Vec::new(),
        });
    }

    // Creators of published mixes earn a commission when someone else buys.
    // A creator whose account is gone just loses the commission; the order
    // itself still processes.
    let percent = state.config.points.commission_percent;
    let mut commissions = Vec::new();
    for (product, quantity) in &resolved {
        if !product.commission_eligible(&buyer) {
            continue;
        }

        let earned = product.points_earned * i64::from(*quantity);
        let commission = commission_points(earned, percent);
        if commission == 0 {
            continue;
        }

        match state.store.adjust_points(
            &product.creator_id,
            commission,
            TransactionType::MixSaleCommission,
            Some(body.order_id.clone()),
            &format!("Sale commission for order {}", body.order_id),
        ) {
            Ok(_) => commissions.push(CommissionGrant {
                user_id: product.creator_id.to_string(),
                points: commission,
            }),
            Err(StoreError::NotFound) => {
                tracing::warn!(
                    creator_id = %product.creator_id,
                    order_id = %body.order_id,
                    "Creator account missing, skipping commission"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(CompleteOrderResponse {
        already_processed: false,
        points_awarded: total_earned,
        commissions,
    })
}

/// Refund request.
#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    /// The refunded order ID.
    pub order_id: String,
    /// The user credited.
    pub user_id: String,
    /// Points to return.
    pub points: i64,
    /// Reason recorded in the ledger.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Refund response.
#[derive(Debug, Serialize)]
pub struct RefundResponse {
    /// Whether this refund had already been processed (no-op).
    pub already_processed: bool,
    /// New balance after the refund.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_balance: Option<i64>,
}

/// Return points for a refunded order (service auth, once per order).
pub async fn refund_order(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<RefundRequest>,
) -> Result<Json<RefundResponse>, ApiError> {
    if body.points <= 0 {
        return Err(ApiError::BadRequest(
            "Refund points must be positive".into(),
        ));
    }

    let user_id: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let notes = body
        .reason
        .unwrap_or_else(|| format!("Refund for order {}", body.order_id));

    let marker = format!("refund:{}", body.order_id);
    match state.store.adjust_points_once(
        &marker,
        &user_id,
        body.points,
        TransactionType::Refund,
        Some(body.order_id.clone()),
        &notes,
    ) {
        Ok(entry) => {
            tracing::info!(
                service = %auth.service_name,
                order_id = %body.order_id,
                user_id = %user_id,
                points = %body.points,
                new_balance = %entry.points_after,
                "Refund credited"
            );

            Ok(Json(RefundResponse {
                already_processed: false,
                points_balance: Some(entry.points_after),
            }))
        }
        Err(StoreError::DuplicateAward { .. }) => Ok(Json(RefundResponse {
            already_processed: true,
            points_balance: None,
        })),
        Err(e) => Err(e.into()),
    }
}
