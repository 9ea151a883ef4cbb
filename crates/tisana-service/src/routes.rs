//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, catalog, health, mixes, orders, points, reviews};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Accounts (user JWT auth)
/// - `POST /v1/accounts` - Register account (grants the welcome bonus once)
/// - `GET /v1/accounts/me` - Get current user's account
///
/// ## Points (user JWT auth)
/// - `GET /v1/points/balance` - Get current balance
/// - `GET /v1/points/history` - List ledger history, newest first
///
/// ## Points (service API key auth)
/// - `POST /v1/points/adjust` - Single-user admin adjustment
/// - `POST /v1/points/adjust/bulk` - Bulk admin adjustment
/// - `POST /v1/points/check` - Sufficient-balance check
///
/// ## Catalog
/// - `GET /v1/catalog/ingredients` / `GET /v1/catalog/packagings` - Builder
///   listings (public)
/// - `PUT` / `DELETE` on the same paths - Service-authenticated maintenance
///
/// ## Mixes (user JWT auth)
/// - `POST /v1/mixes` - Save a composed mix
/// - `GET /v1/mixes` - List own mixes
/// - `GET|PUT|DELETE /v1/mixes/:id` - Read, update, delete
/// - `POST /v1/mixes/:id/weight` - Capacity-clamped weight edit
/// - `DELETE /v1/mixes/:id/ingredients/:ingredient_id` - Remove ingredient
/// - `POST /v1/mixes/:id/publish` - Publish (grants the publish bonus once)
/// - `POST /v1/mixes/:id/like` - Best-effort like counter
/// - `GET /v1/mixes/:id/quote` - Price against the current catalog
/// - `POST /v1/mixes/:id/purchase` - Create/reuse the private product
///
/// ## Orders & reviews (service API key auth)
/// - `POST /v1/orders/complete` - Idempotent completion award
/// - `POST /v1/orders/refund` - Idempotent refund credit
/// - `POST /v1/reviews` - Review bonus, once per (user, product)
///
/// ## Webhooks (HMAC signature)
/// - `POST /webhooks/orders` - Signed order completion
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Accounts
        .route("/v1/accounts", post(accounts::create_account))
        .route("/v1/accounts/me", get(accounts::get_account))
        // Points
        .route("/v1/points/balance", get(points::get_balance))
        .route("/v1/points/history", get(points::get_history))
        .route("/v1/points/adjust", post(points::admin_adjust))
        .route("/v1/points/adjust/bulk", post(points::bulk_adjust))
        .route("/v1/points/check", post(points::check_points))
        // Catalog
        .route(
            "/v1/catalog/ingredients",
            get(catalog::list_ingredients).put(catalog::upsert_ingredient),
        )
        .route(
            "/v1/catalog/ingredients/:id",
            delete(catalog::delete_ingredient),
        )
        .route(
            "/v1/catalog/packagings",
            get(catalog::list_packagings).put(catalog::upsert_packaging),
        )
        .route(
            "/v1/catalog/packagings/:id",
            delete(catalog::delete_packaging),
        )
        // Mixes
        .route("/v1/mixes", post(mixes::create_mix).get(mixes::list_mixes))
        .route(
            "/v1/mixes/:id",
            get(mixes::get_mix)
                .put(mixes::update_mix)
                .delete(mixes::delete_mix),
        )
        .route("/v1/mixes/:id/weight", post(mixes::edit_weight))
        .route(
            "/v1/mixes/:id/ingredients/:ingredient_id",
            delete(mixes::remove_ingredient),
        )
        .route("/v1/mixes/:id/publish", post(mixes::publish_mix))
        .route("/v1/mixes/:id/like", post(mixes::like_mix))
        .route("/v1/mixes/:id/quote", get(mixes::quote_mix))
        .route("/v1/mixes/:id/purchase", post(mixes::purchase_mix))
        // Orders & reviews
        .route("/v1/orders/complete", post(orders::complete_order))
        .route("/v1/orders/refund", post(orders::refund_order))
        .route("/v1/reviews", post(reviews::submit_review))
        // Webhooks
        .route("/webhooks/orders", post(orders::order_webhook))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
