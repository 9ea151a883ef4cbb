//! Application state.

use std::sync::Arc;

use tisana_store::RocksStore;

use crate::config::ServiceConfig;
use crate::notify::{AdminEvent, AdminNotifier};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Admin notification client (optional).
    pub notifier: Option<Arc<AdminNotifier>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let notifier = config.admin_notify_url.as_ref().map(|url| {
            tracing::info!(notify_url = %url, "Admin notifications enabled");
            Arc::new(AdminNotifier::new(url))
        });

        if notifier.is_none() {
            tracing::warn!("Admin notify URL not configured - notifications will be dropped");
        }

        Self {
            store,
            config,
            notifier,
        }
    }

    /// Fire-and-forget an admin notification. Failures are logged at warn
    /// and never surface to the triggering request.
    pub fn notify_admin(&self, event: AdminEvent) {
        let Some(notifier) = self.notifier.clone() else {
            tracing::debug!(?event, "Dropping admin notification (not configured)");
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = notifier.send(&event).await {
                tracing::warn!(error = %e, ?event, "Failed to deliver admin notification");
            }
        });
    }
}
