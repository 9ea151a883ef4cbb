//! Order completion, refund and review bonus integration tests.

mod common;

use common::TestHarness;
use serde_json::json;
use tisana_core::UserId;
use tisana_service::crypto::hmac_sha256_hex;

/// Publish a mix for the harness user and return the public product ID.
async fn publish_product(harness: &TestHarness) -> String {
    let packaging = harness.seed_packaging(100, 200, 200, 20).await;
    let chamomile = harness.seed_ingredient("Chamomile", 15, 15, 2).await;

    let response = harness
        .server
        .post("/v1/mixes")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "name": "Evening calm",
            "packaging_id": packaging,
            "items": [{ "ingredient_id": chamomile, "weight_grams": 50 }]
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let mix_id = body["id"].as_str().unwrap().to_string();

    let response = harness
        .server
        .post(&format!("/v1/mixes/{mix_id}/publish"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["product"]["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Order completion
// ============================================================================

#[tokio::test]
async fn completion_awards_buyer_and_creator_once() {
    let harness = TestHarness::new();
    harness.create_account().await; // creator, 100 + 50 publish bonus
    let product = publish_product(&harness).await;

    let buyer = UserId::generate();
    harness.create_account_for(&buyer).await; // 100

    let response = harness
        .server
        .post("/v1/orders/complete")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-1001",
            "user_id": buyer.to_string(),
            "lines": [{ "product_id": product, "quantity": 1 }]
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], false);
    // The product earns 20 (packaging) + 50g x 2 = 120 points.
    assert_eq!(body["points_awarded"], 120);
    // Creator commission: 10% of 120, rounded half-up.
    let commissions = body["commissions"].as_array().unwrap();
    assert_eq!(commissions.len(), 1);
    assert_eq!(commissions[0]["user_id"], harness.test_user_id.to_string());
    assert_eq!(commissions[0]["points"], 12);

    assert_eq!(harness.balance_of(&buyer).await, 220);
    assert_eq!(harness.balance_of(&harness.test_user_id).await, 162);

    // Replaying the completion hook is a no-op.
    let response = harness
        .server
        .post("/v1/orders/complete")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-1001",
            "user_id": buyer.to_string(),
            "lines": [{ "product_id": product, "quantity": 1 }]
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], true);
    assert_eq!(body["points_awarded"], 0);

    assert_eq!(harness.balance_of(&buyer).await, 220);
    assert_eq!(harness.balance_of(&harness.test_user_id).await, 162);
}

#[tokio::test]
async fn own_purchase_earns_no_commission() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let product = publish_product(&harness).await; // balance 150

    let response = harness
        .server
        .post("/v1/orders/complete")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-1002",
            "user_id": harness.test_user_id.to_string(),
            "lines": [{ "product_id": product, "quantity": 1 }]
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["points_awarded"], 120);
    assert!(body["commissions"].as_array().unwrap().is_empty());

    assert_eq!(harness.balance_of(&harness.test_user_id).await, 270);
}

#[tokio::test]
async fn deleted_products_drop_out_of_the_award() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let buyer = UserId::generate();
    harness.create_account_for(&buyer).await;

    // A line for a product tisana has no record of: skipped silently, the
    // order still processes (and claims its marker).
    let response = harness
        .server
        .post("/v1/orders/complete")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-1003",
            "user_id": buyer.to_string(),
            "lines": [{ "product_id": tisana_core::ProductId::generate().to_string(), "quantity": 2 }]
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], false);
    assert_eq!(body["points_awarded"], 0);
    assert_eq!(harness.balance_of(&buyer).await, 100);

    // The replay is still detected even though nothing was awarded.
    let response = harness
        .server
        .post("/v1/orders/complete")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-1003",
            "user_id": buyer.to_string(),
            "lines": []
        }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], true);
}

#[tokio::test]
async fn completion_requires_service_auth() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/orders/complete")
        .json(&json!({
            "order_id": "wc-1",
            "user_id": UserId::generate().to_string(),
            "lines": []
        }))
        .await;
    response.assert_status_unauthorized();
}

// ============================================================================
// Order webhook
// ============================================================================

#[tokio::test]
async fn webhook_verifies_signature() {
    let harness = TestHarness::with_webhook_secret(Some("hook-secret"));
    harness.create_account().await;

    let buyer = UserId::generate();
    harness.create_account_for(&buyer).await;

    let payload = json!({
        "order_id": "wc-2001",
        "user_id": buyer.to_string(),
        "lines": []
    })
    .to_string();

    // Missing signature.
    let response = harness
        .server
        .post("/webhooks/orders")
        .add_header("content-type", "application/json")
        .text(payload.clone())
        .await;
    response.assert_status_bad_request();

    // Bad signature.
    let response = harness
        .server
        .post("/webhooks/orders")
        .add_header("content-type", "application/json")
        .add_header("x-tisana-signature", "0".repeat(64))
        .text(payload.clone())
        .await;
    response.assert_status_bad_request();

    // Valid signature.
    let signature = hmac_sha256_hex("hook-secret", &payload);
    let response = harness
        .server
        .post("/webhooks/orders")
        .add_header("content-type", "application/json")
        .add_header("x-tisana-signature", signature)
        .text(payload)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], false);
}

// ============================================================================
// Refunds
// ============================================================================

#[tokio::test]
async fn refund_credits_once_per_order() {
    let harness = TestHarness::new();
    harness.create_account().await; // balance 100

    let response = harness
        .server
        .post("/v1/orders/refund")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-3001",
            "user_id": harness.test_user_id.to_string(),
            "points": 50
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], false);
    assert_eq!(body["points_balance"], 150);

    // Replaying the refund is a no-op.
    let response = harness
        .server
        .post("/v1/orders/refund")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-3001",
            "user_id": harness.test_user_id.to_string(),
            "points": 50
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], true);
    assert_eq!(harness.balance_of(&harness.test_user_id).await, 150);

    // Non-positive refunds are rejected.
    let response = harness
        .server
        .post("/v1/orders/refund")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "order_id": "wc-3002",
            "user_id": harness.test_user_id.to_string(),
            "points": 0
        }))
        .await;
    response.assert_status_bad_request();
}

// ============================================================================
// Review bonuses
// ============================================================================

#[tokio::test]
async fn review_bonus_once_per_user_and_product() {
    let harness = TestHarness::new();
    harness.create_account().await;
    let product = publish_product(&harness).await; // balance 150

    let reviewer = UserId::generate();
    harness.create_account_for(&reviewer).await; // 100

    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "user_id": reviewer.to_string(),
            "product_id": product
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["awarded"], true);
    assert_eq!(body["points_balance"], 125);

    // A second review of the same product awards nothing.
    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "user_id": reviewer.to_string(),
            "product_id": product
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["awarded"], false);
    assert_eq!(harness.balance_of(&reviewer).await, 125);
}

#[tokio::test]
async fn review_of_unknown_product_fails() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("x-api-key", harness.service_api_key.clone())
        .add_header("x-service-name", "storefront")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "product_id": tisana_core::ProductId::generate().to_string()
        }))
        .await;
    response.assert_status_not_found();
}
