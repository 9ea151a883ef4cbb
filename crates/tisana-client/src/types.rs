//! Request and response types for the tisana API.

use serde::{Deserialize, Serialize};

/// Check points request.
#[derive(Debug, Clone, Serialize)]
pub struct CheckPointsRequest {
    /// User ID to check.
    pub user_id: String,
    /// Required amount in points.
    pub required: i64,
}

/// Check points response.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckPointsResponse {
    /// Whether the user has sufficient balance.
    pub sufficient: bool,
    /// Current balance.
    pub points_balance: i64,
    /// Required amount.
    pub required: i64,
}

/// Admin adjustment request.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustRequest {
    /// User ID to adjust.
    pub user_id: String,
    /// Signed points change.
    pub points_change: i64,
    /// Reason recorded in the ledger.
    pub reason: String,
    /// Related external object, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Record as an operator reconciliation entry.
    #[serde(default)]
    pub manual: bool,
}

/// Adjustment response.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustResponse {
    /// New balance after the adjustment.
    pub points_balance: i64,
    /// The appended ledger entry ID.
    pub entry_id: String,
    /// The change actually applied (debits clamp at zero).
    pub points_change: i64,
}

/// One line of a completed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    /// The purchased product.
    pub product_id: String,
    /// Quantity purchased.
    pub quantity: u32,
}

/// Order completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteOrderRequest {
    /// The storefront order ID.
    pub order_id: String,
    /// The buyer.
    pub user_id: String,
    /// Purchased lines.
    pub lines: Vec<OrderLine>,
}

/// Commission granted to one creator.
#[derive(Debug, Clone, Deserialize)]
pub struct CommissionGrant {
    /// The creator credited.
    pub user_id: String,
    /// Points credited.
    pub points: i64,
}

/// Order completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteOrderResponse {
    /// Whether this order had already been processed (no-op).
    pub already_processed: bool,
    /// Points awarded to the buyer by this request.
    pub points_awarded: i64,
    /// Commissions credited to mix creators by this request.
    pub commissions: Vec<CommissionGrant>,
}

/// Refund request.
#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    /// The refunded order ID.
    pub order_id: String,
    /// The user credited.
    pub user_id: String,
    /// Points to return.
    pub points: i64,
    /// Reason recorded in the ledger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Refund response.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundResponse {
    /// Whether this refund had already been processed (no-op).
    pub already_processed: bool,
    /// New balance after the refund.
    pub points_balance: Option<i64>,
}

/// Review event.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest {
    /// The reviewing user.
    pub user_id: String,
    /// The reviewed product.
    pub product_id: String,
}

/// Review bonus response.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewResponse {
    /// Whether the bonus was granted by this request.
    pub awarded: bool,
    /// New balance, if the bonus was granted.
    pub points_balance: Option<i64>,
}

/// Error response envelope returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// The error body.
    pub error: ApiErrorBody,
}

/// Error details returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}
