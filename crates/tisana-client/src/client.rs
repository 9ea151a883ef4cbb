//! Tisana HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    AdjustRequest, AdjustResponse, ApiErrorResponse, CheckPointsRequest, CheckPointsResponse,
    CompleteOrderRequest, CompleteOrderResponse, OrderLine, RefundRequest, RefundResponse,
    ReviewRequest, ReviewResponse,
};

/// Options for building a [`TisanaClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,

    /// Service name reported in the `x-service-name` header.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "storefront".to_string(),
        }
    }
}

/// Tisana API client.
///
/// Provides the service-to-service surface: balance checks, admin
/// adjustments, order completion/refund events and review bonuses.
#[derive(Debug, Clone)]
pub struct TisanaClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

impl TisanaClient {
    /// Create a new tisana client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the tisana service (e.g., `"http://tisana:8080"`)
    /// * `api_key` - Service API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new tisana client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_name: options.service_name,
        }
    }

    /// Check whether a user can cover a points payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn check_points(
        &self,
        user_id: impl Into<String>,
        required: i64,
    ) -> Result<CheckPointsResponse, ClientError> {
        let request = CheckPointsRequest {
            user_id: user_id.into(),
            required,
        };

        self.post("/v1/points/check", &request).await
    }

    /// Apply an admin points adjustment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn adjust_points(
        &self,
        request: AdjustRequest,
    ) -> Result<AdjustResponse, ClientError> {
        self.post("/v1/points/adjust", &request).await
    }

    /// Report a completed order. Replays are safe: the service answers with
    /// `already_processed: true` instead of double-awarding.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn complete_order(
        &self,
        order_id: impl Into<String>,
        user_id: impl Into<String>,
        lines: Vec<OrderLine>,
    ) -> Result<CompleteOrderResponse, ClientError> {
        let request = CompleteOrderRequest {
            order_id: order_id.into(),
            user_id: user_id.into(),
            lines,
        };

        self.post("/v1/orders/complete", &request).await
    }

    /// Return points for a refunded order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn refund_order(
        &self,
        request: RefundRequest,
    ) -> Result<RefundResponse, ClientError> {
        self.post("/v1/orders/refund", &request).await
    }

    /// Report a product review for the review bonus.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn submit_review(
        &self,
        user_id: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Result<ReviewResponse, ClientError> {
        let request = ReviewRequest {
            user_id: user_id.into(),
            product_id: product_id.into(),
        };

        self.post("/v1/reviews", &request).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(parsed) => {
                tracing::debug!(
                    status = %status,
                    code = %parsed.error.code,
                    "Tisana API error"
                );
                Err(ClientError::Api {
                    status: status.as_u16(),
                    code: parsed.error.code,
                    message: parsed.error.message,
                })
            }
            Err(_) => Err(ClientError::Api {
                status: status.as_u16(),
                code: "unknown".to_string(),
                message: body,
            }),
        }
    }
}
