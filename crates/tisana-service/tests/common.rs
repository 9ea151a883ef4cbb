//! Common test utilities for tisana integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use tisana_core::UserId;
use tisana_service::{create_router, AppState, PointsPolicy, ServiceConfig};
use tisana_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        Self::with_webhook_secret(None)
    }

    /// Create a harness whose order webhook requires a signature.
    pub fn with_webhook_secret(order_webhook_secret: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_secret: None,
            allow_test_tokens: true,
            service_api_key: Some(service_api_key.clone()),
            order_webhook_secret: order_webhook_secret.map(str::to_string),
            admin_notify_url: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            points: PointsPolicy::default(),
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
            service_api_key,
        }
    }

    /// Get the authorization header for the default test user.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get the authorization header for an arbitrary user.
    pub fn auth_header_for(user_id: &UserId) -> String {
        format!("Bearer test-token:{user_id}")
    }

    /// Register an account for the default test user.
    pub async fn create_account(&self) {
        self.create_account_for(&self.test_user_id).await;
    }

    /// Register an account for an arbitrary user.
    pub async fn create_account_for(&self, user_id: &UserId) {
        self.server
            .post("/v1/accounts")
            .add_header("authorization", Self::auth_header_for(user_id))
            .await
            .assert_status_ok();
        // Ledger entry IDs are ULIDs; space writes out so newest-first
        // ordering is deterministic in tests.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    /// Current balance of a user.
    pub async fn balance_of(&self, user_id: &UserId) -> i64 {
        let response = self
            .server
            .get("/v1/points/balance")
            .add_header("authorization", Self::auth_header_for(user_id))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["points_balance"].as_i64().unwrap()
    }

    /// Seed a packaging row through the admin endpoint; returns its ID.
    pub async fn seed_packaging(
        &self,
        capacity_grams: u32,
        price_cents: i64,
        points_cost: i64,
        points_earned: i64,
    ) -> String {
        let response = self
            .server
            .put("/v1/catalog/packagings")
            .add_header("x-api-key", self.service_api_key.clone())
            .add_header("x-service-name", "tests")
            .json(&json!({
                "name": "Tin",
                "capacity_grams": capacity_grams,
                "price_cents": price_cents,
                "points_cost": points_cost,
                "points_earned": points_earned
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["id"].as_str().unwrap().to_string()
    }

    /// Seed an ingredient row through the admin endpoint; returns its ID.
    pub async fn seed_ingredient(
        &self,
        name: &str,
        price_cents_per_gram: i64,
        points_cost_per_gram: i64,
        points_earned_per_gram: i64,
    ) -> String {
        let response = self
            .server
            .put("/v1/catalog/ingredients")
            .add_header("x-api-key", self.service_api_key.clone())
            .add_header("x-service-name", "tests")
            .json(&json!({
                "name": name,
                "price_cents_per_gram": price_cents_per_gram,
                "points_cost_per_gram": points_cost_per_gram,
                "points_earned_per_gram": points_earned_per_gram
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["id"].as_str().unwrap().to_string()
    }

    /// Adjust a user's points through the admin endpoint.
    pub async fn admin_adjust(&self, user_id: &UserId, points_change: i64) -> serde_json::Value {
        let response = self
            .server
            .post("/v1/points/adjust")
            .add_header("x-api-key", self.service_api_key.clone())
            .add_header("x-service-name", "tests")
            .json(&json!({
                "user_id": user_id.to_string(),
                "points_change": points_change,
                "reason": "test adjustment"
            }))
            .await;
        response.assert_status_ok();
        // Space ULID-ordered ledger writes (see create_account_for).
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
