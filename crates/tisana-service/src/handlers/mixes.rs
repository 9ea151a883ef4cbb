//! Mix handlers: builder CRUD, publishing, quoting and purchasing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tisana_core::{
    compute_totals, Ingredient, IngredientId, Mix, MixComposition, MixItem, MixStatus, MixTotals,
    PackagingId, ShopProduct, TransactionType, UserId,
};
use tisana_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::notify::AdminEvent;
use crate::state::AppState;

/// One weighted ingredient in a request or response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MixItemBody {
    /// Ingredient ID.
    pub ingredient_id: String,
    /// Weight in grams.
    pub weight_grams: u32,
}

/// Mix creation request.
#[derive(Debug, Deserialize)]
pub struct CreateMixRequest {
    /// Display name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Product page story.
    #[serde(default)]
    pub story: String,
    /// Optional image reference.
    pub image: Option<String>,
    /// Selected packaging.
    pub packaging_id: String,
    /// Weighted ingredients.
    pub items: Vec<MixItemBody>,
    /// Save as a favorite (false composes a private mix for direct
    /// purchase).
    #[serde(default = "default_true")]
    pub save: bool,
}

fn default_true() -> bool {
    true
}

/// Mix response.
#[derive(Debug, Serialize)]
pub struct MixResponse {
    /// Mix ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Product page story.
    pub story: String,
    /// Optional image reference.
    pub image: Option<String>,
    /// Lifecycle status.
    pub status: MixStatus,
    /// Like counter.
    pub like_count: u64,
    /// Selected packaging.
    pub packaging_id: String,
    /// Weighted ingredients.
    pub items: Vec<MixItemBody>,
    /// Total ingredient weight in grams.
    pub total_weight: u32,
    /// Public product, if published.
    pub published_product_id: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<&Mix> for MixResponse {
    fn from(mix: &Mix) -> Self {
        Self {
            id: mix.id.to_string(),
            name: mix.name.clone(),
            description: mix.description.clone(),
            story: mix.story.clone(),
            image: mix.image.clone(),
            status: mix.status,
            like_count: mix.like_count,
            packaging_id: mix.composition.packaging_id.to_string(),
            items: mix
                .composition
                .items
                .iter()
                .map(|item| MixItemBody {
                    ingredient_id: item.ingredient_id.to_string(),
                    weight_grams: item.weight_grams,
                })
                .collect(),
            total_weight: mix.composition.total_weight(),
            published_product_id: mix.published_product_id.map(|id| id.to_string()),
            created_at: mix.created_at.to_rfc3339(),
        }
    }
}

fn parse_composition(packaging_id: &str, items: &[MixItemBody]) -> Result<MixComposition, ApiError> {
    let packaging_id: PackagingId = packaging_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid packaging ID".into()))?;

    let mut composition = MixComposition::new(packaging_id);
    for item in items {
        let ingredient_id: IngredientId = item
            .ingredient_id
            .parse()
            .map_err(|_| ApiError::BadRequest("Invalid ingredient ID".into()))?;
        composition.items.push(MixItem {
            ingredient_id,
            weight_grams: item.weight_grams,
        });
    }

    Ok(composition)
}

/// Fetch the packaging a composition needs, rejecting unavailable rows.
fn selectable_packaging(
    state: &AppState,
    packaging_id: &PackagingId,
) -> Result<tisana_core::Packaging, ApiError> {
    state
        .store
        .get_packaging(packaging_id)?
        .filter(|p| p.available)
        .ok_or_else(|| {
            ApiError::BadRequest(format!("packaging unavailable: {packaging_id}"))
        })
}

/// Compute totals for a composition against the current catalog.
///
/// Deleted catalog rows are skipped silently; only database failures error.
fn quote_composition(
    state: &AppState,
    composition: &MixComposition,
) -> Result<MixTotals, ApiError> {
    let packaging = state.store.get_packaging(&composition.packaging_id)?;

    let mut catalog: HashMap<IngredientId, Ingredient> = HashMap::new();
    for item in &composition.items {
        if let Some(ingredient) = state.store.get_ingredient(&item.ingredient_id)? {
            catalog.insert(item.ingredient_id, ingredient);
        } else {
            tracing::debug!(
                ingredient_id = %item.ingredient_id,
                "Ingredient missing from catalog, skipping its contribution"
            );
        }
    }

    Ok(compute_totals(composition, packaging.as_ref(), |id| {
        catalog.get(id).cloned()
    }))
}

fn load_mix(state: &AppState, raw_id: &str) -> Result<Mix, ApiError> {
    let mix_id = raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid mix ID".into()))?;

    state
        .store
        .get_mix(&mix_id)?
        .ok_or_else(|| ApiError::NotFound("Mix not found".into()))
}

/// Load a mix the caller may read: their own, or any published mix.
/// Foreign private mixes surface as not-found rather than forbidden.
fn load_readable_mix(state: &AppState, raw_id: &str, user: &UserId) -> Result<Mix, ApiError> {
    let mix = load_mix(state, raw_id)?;
    if mix.is_owned_by(user) || mix.is_published() {
        Ok(mix)
    } else {
        Err(ApiError::NotFound("Mix not found".into()))
    }
}

/// Load a mix the caller may modify. Ownership violations are rejected
/// outright.
fn load_owned_mix(state: &AppState, raw_id: &str, user: &UserId) -> Result<Mix, ApiError> {
    let mix = load_mix(state, raw_id)?;
    if mix.is_owned_by(user) {
        Ok(mix)
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Save a composed mix.
pub async fn create_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateMixRequest>,
) -> Result<Json<MixResponse>, ApiError> {
    let composition = parse_composition(&body.packaging_id, &body.items)?;
    let packaging = selectable_packaging(&state, &composition.packaging_id)?;
    composition.validate(packaging.capacity_grams)?;

    let status = if body.save {
        MixStatus::Favorite
    } else {
        MixStatus::Private
    };

    let mix = Mix::new(
        auth.user_id,
        body.name,
        body.description,
        body.story,
        body.image,
        composition,
        status,
    );
    state.store.put_mix(&mix)?;

    tracing::info!(
        user_id = %auth.user_id,
        mix_id = %mix.id,
        status = ?mix.status,
        total_weight = %mix.composition.total_weight(),
        "Mix saved"
    );

    Ok(Json(MixResponse::from(&mix)))
}

/// Mix listing response.
#[derive(Debug, Serialize)]
pub struct MixListResponse {
    /// The user's favorite and published mixes.
    pub mixes: Vec<MixResponse>,
}

/// List the authenticated user's mixes. Private direct-purchase mixes are
/// omitted from the favorites listing.
pub async fn list_mixes(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<MixListResponse>, ApiError> {
    let mixes = state
        .store
        .list_mixes_by_user(&auth.user_id)?
        .iter()
        .filter(|mix| mix.status != MixStatus::Private)
        .map(MixResponse::from)
        .collect();

    Ok(Json(MixListResponse { mixes }))
}

/// Get one mix.
pub async fn get_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MixResponse>, ApiError> {
    let mix = load_readable_mix(&state, &id, &auth.user_id)?;
    Ok(Json(MixResponse::from(&mix)))
}

/// Mix update request. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateMixRequest {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New story.
    pub story: Option<String>,
    /// New image reference.
    pub image: Option<String>,
    /// Replacement packaging ID (with `items`).
    pub packaging_id: Option<String>,
    /// Replacement ingredient list (with `packaging_id`).
    pub items: Option<Vec<MixItemBody>>,
}

/// Update a mix's metadata or composition.
pub async fn update_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateMixRequest>,
) -> Result<Json<MixResponse>, ApiError> {
    let mut mix = load_owned_mix(&state, &id, &auth.user_id)?;

    if let Some(name) = body.name {
        mix.name = name;
    }
    if let Some(description) = body.description {
        mix.description = description;
    }
    if let Some(story) = body.story {
        mix.story = story;
    }
    if let Some(image) = body.image {
        mix.image = Some(image);
    }

    if body.packaging_id.is_some() || body.items.is_some() {
        if mix.is_published() {
            return Err(ApiError::Conflict(
                "Published mix composition is frozen".into(),
            ));
        }

        let packaging_id = body
            .packaging_id
            .unwrap_or_else(|| mix.composition.packaging_id.to_string());
        let items: Vec<MixItemBody> = body.items.unwrap_or_else(|| {
            mix.composition
                .items
                .iter()
                .map(|item| MixItemBody {
                    ingredient_id: item.ingredient_id.to_string(),
                    weight_grams: item.weight_grams,
                })
                .collect()
        });

        let composition = parse_composition(&packaging_id, &items)?;
        let packaging = selectable_packaging(&state, &composition.packaging_id)?;
        composition.validate(packaging.capacity_grams)?;
        mix.composition = composition;
    }

    state.store.put_mix(&mix)?;

    Ok(Json(MixResponse::from(&mix)))
}

/// Single weight edit request.
#[derive(Debug, Deserialize)]
pub struct EditWeightRequest {
    /// The ingredient to set (added to the mix if absent).
    pub ingredient_id: String,
    /// Requested weight in grams, at least 1.
    pub weight_grams: u32,
}

/// Weight edit response.
#[derive(Debug, Serialize)]
pub struct EditWeightResponse {
    /// The weight the caller asked for.
    pub requested: u32,
    /// The weight actually stored after capacity clamping.
    pub applied: u32,
    /// Whether the edit was clamped down.
    pub clamped: bool,
    /// New total ingredient weight.
    pub total_weight: u32,
}

/// Edit one ingredient's weight, clamping against the packaging capacity.
///
/// If the edit would push the total over capacity, only the edited
/// ingredient is clamped down; the others keep their weights.
pub async fn edit_weight(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<EditWeightRequest>,
) -> Result<Json<EditWeightResponse>, ApiError> {
    let mut mix = load_owned_mix(&state, &id, &auth.user_id)?;
    if mix.is_published() {
        return Err(ApiError::Conflict(
            "Published mix composition is frozen".into(),
        ));
    }

    let ingredient_id: IngredientId = body
        .ingredient_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid ingredient ID".into()))?;

    let packaging = selectable_packaging(&state, &mix.composition.packaging_id)?;
    let applied = mix
        .composition
        .set_weight(ingredient_id, body.weight_grams, packaging.capacity_grams)?;

    state.store.put_mix(&mix)?;

    Ok(Json(EditWeightResponse {
        requested: applied.requested,
        applied: applied.applied,
        clamped: applied.clamped,
        total_weight: mix.composition.total_weight(),
    }))
}

/// Remove an ingredient from a mix (weights cannot be set to zero).
pub async fn remove_ingredient(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((id, ingredient_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut mix = load_owned_mix(&state, &id, &auth.user_id)?;
    if mix.is_published() {
        return Err(ApiError::Conflict(
            "Published mix composition is frozen".into(),
        ));
    }

    let ingredient_id: IngredientId = ingredient_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid ingredient ID".into()))?;

    if mix.composition.items.len() == 1
        && mix.composition.items[0].ingredient_id == ingredient_id
    {
        return Err(ApiError::BadRequest(
            "A mix must keep at least one ingredient".into(),
        ));
    }

    let removed = mix.composition.remove_ingredient(&ingredient_id);
    if removed {
        state.store.put_mix(&mix)?;
    }

    Ok(Json(serde_json::json!({
        "removed": removed,
        "total_weight": mix.composition.total_weight()
    })))
}

/// Delete a mix.
///
/// Deleting a published mix notifies an administrator to remove the shop
/// product manually; there is no automated cascade.
pub async fn delete_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mix = load_owned_mix(&state, &id, &auth.user_id)?;

    state.store.delete_mix(&mix.id)?;

    tracing::info!(
        user_id = %auth.user_id,
        mix_id = %mix.id,
        was_published = %mix.is_published(),
        "Mix deleted"
    );

    if mix.is_published() {
        state.notify_admin(AdminEvent::PublishedMixDeleted {
            mix_id: mix.id.to_string(),
            mix_name: mix.name.clone(),
            user_id: auth.user_id.to_string(),
            product_id: mix.published_product_id.map(|id| id.to_string()),
        });
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Publish response.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    /// The public product created for the mix.
    pub product: ProductBody,
    /// Whether the publish bonus was granted by this request (false when an
    /// earlier attempt already granted it).
    pub bonus_awarded: bool,
}

/// Product details in responses.
#[derive(Debug, Serialize)]
pub struct ProductBody {
    /// Product ID.
    pub id: String,
    /// Source mix ID.
    pub mix_id: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Points cost.
    pub points_cost: i64,
    /// Points earned on purchase.
    pub points_earned: i64,
}

impl From<&ShopProduct> for ProductBody {
    fn from(product: &ShopProduct) -> Self {
        Self {
            id: product.id.to_string(),
            mix_id: product.mix_id.to_string(),
            price_cents: product.price_cents,
            points_cost: product.points_cost,
            points_earned: product.points_earned,
        }
    }
}

/// Promote a favorite mix to a public catalog listing.
///
/// The flat publish bonus is granted at most once per mix: the award is
/// marker-guarded and happens before the state transition is persisted, so a
/// retried request after a transient failure completes the publish without a
/// second award.
pub async fn publish_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PublishResponse>, ApiError> {
    let mut mix = load_owned_mix(&state, &id, &auth.user_id)?;

    let totals = quote_composition(&state, &mix.composition)?;
    let product = ShopProduct::public_listing(&mix, totals);
    mix.publish(product.id).map_err(ApiError::from)?;

    let bonus = state.config.points.publish_bonus;
    let bonus_awarded = if bonus > 0 {
        let marker = format!("publish:{}", mix.id);
        match state.store.adjust_points_once(
            &marker,
            &auth.user_id,
            bonus,
            TransactionType::Bonus,
            Some(mix.id.to_string()),
            &format!("Publish bonus for mix '{}'", mix.name),
        ) {
            Ok(_) => true,
            Err(StoreError::DuplicateAward { .. }) => {
                tracing::debug!(mix_id = %mix.id, "Publish bonus already awarded");
                false
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        false
    };

    state.store.put_product(&product)?;
    state.store.put_mix(&mix)?;

    tracing::info!(
        user_id = %auth.user_id,
        mix_id = %mix.id,
        product_id = %product.id,
        price_cents = %product.price_cents,
        bonus_awarded = %bonus_awarded,
        "Mix published"
    );

    Ok(Json(PublishResponse {
        product: ProductBody::from(&product),
        bonus_awarded,
    }))
}

/// Like a mix. The counter is display-only and best-effort: a failed update
/// is logged, never surfaced.
pub async fn like_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut mix = load_readable_mix(&state, &id, &auth.user_id)?;

    mix.like_count += 1;
    if let Err(e) = state.store.put_mix(&mix) {
        tracing::warn!(mix_id = %mix.id, error = %e, "Failed to update like counter");
    }

    Ok(Json(serde_json::json!({
        "liked": true,
        "like_count": mix.like_count
    })))
}

/// Quote response: accumulator totals from the current catalog.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    /// Total price in cents.
    pub price_cents: i64,
    /// Price formatted as dollars.
    pub price_formatted: String,
    /// Total points cost.
    pub points_cost: i64,
    /// Total points earned on purchase.
    pub points_earned: i64,
    /// Total ingredient weight in grams.
    pub total_weight: u32,
}

/// Price a mix against current catalog rows.
pub async fn quote_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let mix = load_readable_mix(&state, &id, &auth.user_id)?;
    let totals = quote_composition(&state, &mix.composition)?;

    Ok(Json(QuoteResponse {
        price_cents: totals.price_cents,
        price_formatted: totals.price_formatted(),
        points_cost: totals.points_cost,
        points_earned: totals.points_earned,
        total_weight: mix.composition.total_weight(),
    }))
}

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseMixRequest {
    /// Pay the points cost instead of currency.
    #[serde(default)]
    pub pay_with_points: bool,
}

/// Cart insertion payload handed back to the storefront.
#[derive(Debug, Serialize)]
pub struct CartItem {
    /// The product to add to the cart.
    pub product_id: String,
    /// Unit price in cents.
    pub price_cents: i64,
    /// Quantity.
    pub quantity: u32,
}

/// Purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// The private product for this `(mix, buyer)` pair.
    pub product: ProductBody,
    /// Whether an existing private product was reused.
    pub reused: bool,
    /// Cart insertion for the storefront.
    pub cart_item: CartItem,
    /// Whether points were debited.
    pub paid_with_points: bool,
    /// New balance after a points payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_balance: Option<i64>,
}

/// Buy a mix: create (or reuse) the buyer's private product and optionally
/// pay its points cost.
///
/// The insufficient-balance check happens here, before the mutator runs; the
/// mutator itself only clamps and must never be reached on an uncovered
/// debit.
pub async fn purchase_mix(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<PurchaseMixRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let mix = load_readable_mix(&state, &id, &auth.user_id)?;

    // Reuse the existing private product for this (mix, buyer) pair.
    let (product, reused) = match state.store.get_private_product(&mix.id, &auth.user_id)? {
        Some(existing) => (existing, true),
        None => {
            let totals = quote_composition(&state, &mix.composition)?;
            let product = ShopProduct::private_copy(&mix, auth.user_id, totals);
            state.store.put_product(&product)?;
            (product, false)
        }
    };

    let mut points_balance = None;
    if body.pay_with_points {
        let account = state
            .store
            .get_account(&auth.user_id)?
            .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

        let required = product.points_cost;
        if !account.has_sufficient_points(required) {
            return Err(ApiError::InsufficientPoints {
                balance: account.points_balance,
                required,
            });
        }

        let entry = state.store.adjust_points(
            &auth.user_id,
            -required,
            TransactionType::OrderPayment,
            Some(product.id.to_string()),
            &format!("Points payment for mix '{}'", mix.name),
        )?;
        points_balance = Some(entry.points_after);

        tracing::info!(
            user_id = %auth.user_id,
            mix_id = %mix.id,
            product_id = %product.id,
            points = %required,
            new_balance = %entry.points_after,
            "Mix purchased with points"
        );
    }

    Ok(Json(PurchaseResponse {
        cart_item: CartItem {
            product_id: product.id.to_string(),
            price_cents: product.price_cents,
            quantity: 1,
        },
        product: ProductBody::from(&product),
        reused,
        paid_with_points: body.pay_with_points,
        points_balance,
    }))
}
