//! Best-effort admin notifications.
//!
//! Published-mix deletions (and similar operator-interest events) are posted
//! as JSON to a configured URL. Delivery is best-effort: failures are logged
//! and never block the primary operation.

use std::time::Duration;

use serde::Serialize;

/// An event worth telling an administrator about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AdminEvent {
    /// A published mix was deleted; the shop product needs manual removal.
    PublishedMixDeleted {
        /// The deleted mix ID.
        mix_id: String,
        /// The deleted mix name.
        mix_name: String,
        /// The owner who deleted it.
        user_id: String,
        /// The public product left behind, if known.
        product_id: Option<String>,
    },
}

/// Errors from the notification client.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The HTTP request failed.
    #[error("notify request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("notify endpoint returned status {0}")]
    Status(u16),
}

/// Client posting admin events to a webhook URL.
#[derive(Debug, Clone)]
pub struct AdminNotifier {
    client: reqwest::Client,
    url: String,
}

impl AdminNotifier {
    /// Create a notifier for the given URL.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (does not happen with
    /// default TLS settings).
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            url: url.into(),
        }
    }

    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the endpoint rejects it.
    pub async fn send(&self, event: &AdminEvent) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(event).send().await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}
