//! Catalog handlers: ingredient and packaging rows.
//!
//! The builder reads listed rows; the storefront maintains them through the
//! service-authenticated upsert and delete endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tisana_core::{Ingredient, IngredientId, Packaging, PackagingId};
use tisana_store::Store;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Ingredient listing response.
#[derive(Debug, Serialize)]
pub struct IngredientsResponse {
    /// Ingredients offered in the builder (in stock and visible).
    pub ingredients: Vec<Ingredient>,
}

/// List ingredients the builder can offer.
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IngredientsResponse>, ApiError> {
    let ingredients = state
        .store
        .list_ingredients()?
        .into_iter()
        .filter(Ingredient::is_listed)
        .collect();

    Ok(Json(IngredientsResponse { ingredients }))
}

/// Packaging listing response.
#[derive(Debug, Serialize)]
pub struct PackagingsResponse {
    /// Packagings currently selectable.
    pub packagings: Vec<Packaging>,
}

/// List selectable packagings.
pub async fn list_packagings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PackagingsResponse>, ApiError> {
    let packagings = state
        .store
        .list_packagings()?
        .into_iter()
        .filter(|p| p.available)
        .collect();

    Ok(Json(PackagingsResponse { packagings }))
}

/// Ingredient upsert request. Omitting `id` creates a new row.
#[derive(Debug, Deserialize)]
pub struct UpsertIngredientRequest {
    /// Existing ingredient ID, if updating.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Price per gram in cents.
    pub price_cents_per_gram: i64,
    /// Points cost per gram.
    pub points_cost_per_gram: i64,
    /// Points earned per gram.
    pub points_earned_per_gram: i64,
    /// In stock flag.
    #[serde(default = "default_true")]
    pub in_stock: bool,
    /// Visibility flag.
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

/// Create or update an ingredient row.
pub async fn upsert_ingredient(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<UpsertIngredientRequest>,
) -> Result<Json<Ingredient>, ApiError> {
    let id = match &body.id {
        Some(raw) => raw
            .parse::<IngredientId>()
            .map_err(|_| ApiError::BadRequest("Invalid ingredient ID".into()))?,
        None => IngredientId::generate(),
    };

    let ingredient = Ingredient {
        id,
        name: body.name,
        price_cents_per_gram: body.price_cents_per_gram,
        points_cost_per_gram: body.points_cost_per_gram,
        points_earned_per_gram: body.points_earned_per_gram,
        in_stock: body.in_stock,
        visible: body.visible,
    };

    state.store.put_ingredient(&ingredient)?;

    tracing::info!(
        service = %auth.service_name,
        ingredient_id = %ingredient.id,
        name = %ingredient.name,
        "Ingredient upserted"
    );

    Ok(Json(ingredient))
}

/// Delete an ingredient row.
///
/// Historical mixes referencing the row keep working; their totals silently
/// lose this ingredient's contribution.
pub async fn delete_ingredient(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: IngredientId = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid ingredient ID".into()))?;

    state.store.delete_ingredient(&id)?;

    tracing::info!(
        service = %auth.service_name,
        ingredient_id = %id,
        "Ingredient deleted"
    );

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Packaging upsert request. Omitting `id` creates a new row.
#[derive(Debug, Deserialize)]
pub struct UpsertPackagingRequest {
    /// Existing packaging ID, if updating.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Capacity in grams.
    pub capacity_grams: u32,
    /// Flat price in cents.
    pub price_cents: i64,
    /// Flat points cost.
    pub points_cost: i64,
    /// Flat points earned.
    pub points_earned: i64,
    /// Availability flag.
    #[serde(default = "default_true")]
    pub available: bool,
}

/// Create or update a packaging row.
pub async fn upsert_packaging(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<UpsertPackagingRequest>,
) -> Result<Json<Packaging>, ApiError> {
    if body.capacity_grams == 0 {
        return Err(ApiError::BadRequest(
            "Packaging capacity must be at least 1 gram".into(),
        ));
    }

    let id = match &body.id {
        Some(raw) => raw
            .parse::<PackagingId>()
            .map_err(|_| ApiError::BadRequest("Invalid packaging ID".into()))?,
        None => PackagingId::generate(),
    };

    let packaging = Packaging {
        id,
        name: body.name,
        capacity_grams: body.capacity_grams,
        price_cents: body.price_cents,
        points_cost: body.points_cost,
        points_earned: body.points_earned,
        available: body.available,
    };

    state.store.put_packaging(&packaging)?;

    tracing::info!(
        service = %auth.service_name,
        packaging_id = %packaging.id,
        capacity_grams = %packaging.capacity_grams,
        "Packaging upserted"
    );

    Ok(Json(packaging))
}

/// Delete a packaging row.
pub async fn delete_packaging(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: PackagingId = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid packaging ID".into()))?;

    state.store.delete_packaging(&id)?;

    tracing::info!(
        service = %auth.service_name,
        packaging_id = %id,
        "Packaging deleted"
    );

    Ok(Json(serde_json::json!({ "deleted": true })))
}
