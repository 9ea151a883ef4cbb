//! Mix builder, publishing and purchase integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;
use tisana_core::UserId;

/// Create a mix for a user and return its ID.
async fn create_mix(
    harness: &TestHarness,
    user_id: &UserId,
    packaging_id: &str,
    items: &[(&str, u32)],
) -> String {
    let items: Vec<_> = items
        .iter()
        .map(|(id, grams)| json!({ "ingredient_id": id, "weight_grams": grams }))
        .collect();

    let response = harness
        .server
        .post("/v1/mixes")
        .add_header("authorization", TestHarness::auth_header_for(user_id))
        .json(&json!({
            "name": "Evening calm",
            "description": "Soft and floral",
            "story": "Blended for winding down.",
            "packaging_id": packaging_id,
            "items": items
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Composition validation
// ============================================================================

#[tokio::test]
async fn create_mix_validates_composition() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    // Over capacity: 60g + 60g in a 100g tin.
    let hibiscus = harness.seed_ingredient("Hibiscus", 10, 10, 1).await;
    let response = harness
        .server
        .post("/v1/mixes")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "name": "Too much",
            "packaging_id": packaging,
            "items": [
                { "ingredient_id": chamomile, "weight_grams": 60 },
                { "ingredient_id": hibiscus, "weight_grams": 60 }
            ]
        }))
        .await;
    response.assert_status_bad_request();

    // No ingredients.
    let response = harness
        .server
        .post("/v1/mixes")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "name": "Empty",
            "packaging_id": packaging,
            "items": []
        }))
        .await;
    response.assert_status_bad_request();

    // Zero weight.
    let response = harness
        .server
        .post("/v1/mixes")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "name": "Weightless",
            "packaging_id": packaging,
            "items": [{ "ingredient_id": chamomile, "weight_grams": 0 }]
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn create_mix_rejects_unavailable_packaging() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let response = harness
        .server
        .put("/v1/catalog/packagings")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "tests")
        .json(&json!({
            "name": "Retired tin",
            "capacity_grams": 100,
            "price_cents": 200,
            "points_cost": 200,
            "points_earned": 20,
            "available": false
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let retired = body["id"].as_str().unwrap();

    let response = harness
        .server
        .post("/v1/mixes")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "name": "Nope",
            "packaging_id": retired,
            "items": [{ "ingredient_id": chamomile, "weight_grams": 10 }]
        }))
        .await;
    response.assert_status_bad_request();
}

// ============================================================================
// Capacity clamp
// ============================================================================

#[tokio::test]
async fn weight_edit_clamps_at_capacity() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;
    let hibiscus = harness.seed_ingredient("Hibiscus", 10, 10, 1).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 40), (&hibiscus, 40)],
    )
    .await;

    // Raising one 40g ingredient to 80g in a 100g tin clamps it to 60g.
    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/weight"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "ingredient_id": chamomile, "weight_grams": 80 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["requested"], 80);
    assert_eq!(body["applied"], 60);
    assert_eq!(body["clamped"], true);
    assert_eq!(body["total_weight"], 100);

    // The other ingredient is untouched.
    let response = harness
        .server
        .get(&format!("/v1/mixes/{mix_id}"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["weight_grams"], 60);
    assert_eq!(items[1]["weight_grams"], 40);
}

#[tokio::test]
async fn weight_edit_rejects_zero() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 40)],
    )
    .await;

    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/weight"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "ingredient_id": chamomile, "weight_grams": 0 }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn remove_ingredient_keeps_mix_nonempty() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;
    let hibiscus = harness.seed_ingredient("Hibiscus", 10, 10, 1).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 40), (&hibiscus, 40)],
    )
    .await;

    let response = harness
        .server
        .delete(&format!("/v1/mixes/{mix_id}/ingredients/{hibiscus}"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["removed"], true);
    assert_eq!(body["total_weight"], 40);

    // The last ingredient cannot be removed; the mix would be empty.
    let response = harness
        .server
        .delete(&format!("/v1/mixes/{mix_id}/ingredients/{chamomile}"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_bad_request();
}

// ============================================================================
// Quoting
// ============================================================================

#[tokio::test]
async fn quote_matches_hand_computed_totals() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 50)],
    )
    .await;

    let response = harness
        .server
        .get(&format!("/v1/mixes/{mix_id}/quote"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["price_cents"], 950);
    assert_eq!(body["price_formatted"], "$9.50");
    assert_eq!(body["points_cost"], 950);
    assert_eq!(body["points_earned"], 120);
    assert_eq!(body["total_weight"], 50);
}

#[tokio::test]
async fn quote_drops_deleted_ingredient_silently() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 50)],
    )
    .await;

    // Delete the catalog row out from under the saved mix.
    let response = harness
        .server
        .delete(&format!("/v1/catalog/ingredients/{chamomile}"))
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "tests")
        .await;
    response.assert_status_ok();

    // The quote still succeeds; the ingredient's contribution is gone.
    let response = harness
        .server
        .get(&format!("/v1/mixes/{mix_id}/quote"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["price_cents"], 200);
    assert_eq!(body["points_cost"], 200);
    assert_eq!(body["points_earned"], 20);
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn foreign_mix_mutations_are_forbidden() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 40)],
    )
    .await;

    let stranger = UserId::generate();
    harness.create_account_for(&stranger).await;

    let response = harness
        .server
        .put(&format!("/v1/mixes/{mix_id}"))
        .add_header("authorization", TestHarness::auth_header_for(&stranger))
        .json(&json!({ "name": "Mine now" }))
        .await;
    response.assert_status_forbidden();

    let response = harness
        .server
        .delete(&format!("/v1/mixes/{mix_id}"))
        .add_header("authorization", TestHarness::auth_header_for(&stranger))
        .await;
    response.assert_status_forbidden();

    // Foreign favorites read as not-found rather than leaking existence.
    let response = harness
        .server
        .get(&format!("/v1/mixes/{mix_id}"))
        .add_header("authorization", TestHarness::auth_header_for(&stranger))
        .await;
    response.assert_status_not_found();
}

// ============================================================================
// Publishing
// ============================================================================

#[tokio::test]
async fn publish_awards_bonus_exactly_once() {
    let harness = TestHarness::new();
    harness.create_account().await; // balance 100
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 50)],
    )
    .await;

    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/publish"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["bonus_awarded"], true);
    assert_eq!(body["product"]["price_cents"], 950);
    assert_eq!(body["product"]["points_earned"], 120);

    assert_eq!(harness.balance_of(&harness.test_user_id).await, 150);

    // A retried publish conflicts and cannot double-award.
    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/publish"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(harness.balance_of(&harness.test_user_id).await, 150);
}

#[tokio::test]
async fn published_mix_is_readable_by_others() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 50)],
    )
    .await;

    harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/publish"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    let stranger = UserId::generate();
    harness.create_account_for(&stranger).await;

    let response = harness
        .server
        .get(&format!("/v1/mixes/{mix_id}"))
        .add_header("authorization", TestHarness::auth_header_for(&stranger))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "published");

    // Composition edits are frozen after publishing.
    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/weight"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "ingredient_id": chamomile, "weight_grams": 30 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_a_published_mix_succeeds_without_product_cascade() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 50)],
    )
    .await;

    harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/publish"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    // Deletion succeeds; the admin notification is best-effort and the shop
    // product is left for manual removal.
    let response = harness
        .server
        .delete(&format!("/v1/mixes/{mix_id}"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();

    let response = harness
        .server
        .get(&format!("/v1/mixes/{mix_id}"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_not_found();
}

// ============================================================================
// Likes
// ============================================================================

#[tokio::test]
async fn like_increments_counter() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 50)],
    )
    .await;

    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/like"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["like_count"], 1);
}

// ============================================================================
// Purchases
// ============================================================================

#[tokio::test]
async fn purchase_reuses_private_product() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 50)],
    )
    .await;

    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/purchase"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["reused"], false);
    assert_eq!(body["cart_item"]["quantity"], 1);
    let first_product = body["product"]["id"].as_str().unwrap().to_string();

    // Re-purchasing reuses the same private product.
    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/purchase"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["reused"], true);
    assert_eq!(body["product"]["id"], first_product);
}

#[tokio::test]
async fn points_payment_is_fail_closed() {
    let harness = TestHarness::new();
    harness.create_account().await; // balance 100
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    // 200 + 20g x 15 = 500 points cost.
    let mix_id = create_mix(
        &harness,
        &harness.test_user_id,
        &packaging,
        &[(&chamomile, 20)],
    )
    .await;

    // Insufficient balance is rejected before the mutator runs.
    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/purchase"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "pay_with_points": true }))
        .await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_points");
    assert_eq!(harness.balance_of(&harness.test_user_id).await, 100);

    // Fund to exactly the cost and pay: balance 500 -> 0 with a single
    // order_payment ledger row (-500, before=500, after=0).
    harness.admin_adjust(&harness.test_user_id, 400).await;
    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/purchase"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "pay_with_points": true }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["paid_with_points"], true);
    assert_eq!(body["points_balance"], 0);

    let response = harness
        .server
        .get("/v1/points/history?limit=1")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let entry = &body["entries"][0];
    assert_eq!(entry["transaction_type"], "order_payment");
    assert_eq!(entry["points_change"], -500);
    assert_eq!(entry["points_before"], 500);
    assert_eq!(entry["points_after"], 0);

    // At zero balance the payment path stays closed; the clamping mutator is
    // never reached.
    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/purchase"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "pay_with_points": true }))
        .await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    assert_eq!(harness.balance_of(&harness.test_user_id).await, 0);
}
