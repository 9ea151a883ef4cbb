//! Review bonus handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use tisana_core::{ProductId, TransactionType, UserId};
use tisana_store::{Store, StoreError};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Review event from the storefront.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// The reviewing user.
    pub user_id: String,
    /// The reviewed product.
    pub product_id: String,
}

/// Review bonus response.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    /// Whether the bonus was granted by this request (false when the user
    /// already reviewed this product).
    pub awarded: bool,
    /// New balance, if the bonus was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_balance: Option<i64>,
}

/// Award the review bonus, once per `(user, product)` pair.
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let user_id: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;
    let product_id: ProductId = body
        .product_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid product ID".into()))?;

    state
        .store
        .get_product(&product_id)?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    let bonus = state.config.points.review_bonus;
    if bonus <= 0 {
        return Ok(Json(ReviewResponse {
            awarded: false,
            points_balance: None,
        }));
    }

    let marker = format!("review:{user_id}:{product_id}");
    match state.store.adjust_points_once(
        &marker,
        &user_id,
        bonus,
        TransactionType::ReviewBonus,
        Some(product_id.to_string()),
        "Review bonus",
    ) {
        Ok(entry) => {
            tracing::info!(
                service = %auth.service_name,
                user_id = %user_id,
                product_id = %product_id,
                points = %bonus,
                new_balance = %entry.points_after,
                "Review bonus awarded"
            );

            Ok(Json(ReviewResponse {
                awarded: true,
                points_balance: Some(entry.points_after),
            }))
        }
        Err(StoreError::DuplicateAward { .. }) => Ok(Json(ReviewResponse {
            awarded: false,
            points_balance: None,
        })),
        Err(e) => Err(e.into()),
    }
}
