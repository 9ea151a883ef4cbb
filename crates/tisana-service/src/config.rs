//! Service configuration.

/// Points awarded or charged by policy, loaded alongside the service config.
#[derive(Debug, Clone)]
pub struct PointsPolicy {
    /// One-time bonus on account registration.
    pub registration_bonus: i64,

    /// Flat bonus for publishing a mix.
    pub publish_bonus: i64,

    /// Bonus for reviewing a product.
    pub review_bonus: i64,

    /// Percent of earned points credited to the creator when a published mix
    /// sells to someone else.
    pub commission_percent: u8,
}

impl Default for PointsPolicy {
    fn default() -> Self {
        Self {
            registration_bonus: 100,
            publish_bonus: 50,
            review_bonus: 25,
            commission_percent: 10,
        }
    }
}

impl PointsPolicy {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            registration_bonus: env_i64("POINTS_REGISTRATION_BONUS", defaults.registration_bonus),
            publish_bonus: env_i64("POINTS_PUBLISH_BONUS", defaults.publish_bonus),
            review_bonus: env_i64("POINTS_REVIEW_BONUS", defaults.review_bonus),
            commission_percent: std::env::var("POINTS_COMMISSION_PERCENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.commission_percent),
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/tisana").
    pub data_dir: String,

    /// HS256 secret for validating user JWTs.
    pub auth_secret: Option<String>,

    /// Accept `test-token:<uuid>` bearer tokens. Only ever set by test
    /// harnesses; defaults to false.
    pub allow_test_tokens: bool,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// HMAC secret for order webhook signatures (optional).
    pub order_webhook_secret: Option<String>,

    /// URL to POST admin notifications to (optional).
    pub admin_notify_url: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Points award policy.
    pub points: PointsPolicy,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/tisana".into()),
            auth_secret: std::env::var("AUTH_SECRET").ok(),
            allow_test_tokens: false,
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            order_webhook_secret: std::env::var("ORDER_WEBHOOK_SECRET").ok(),
            admin_notify_url: std::env::var("ADMIN_NOTIFY_URL").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            points: PointsPolicy::from_env(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/tisana".into(),
            auth_secret: None,
            allow_test_tokens: false,
            service_api_key: None,
            order_webhook_secret: None,
            admin_notify_url: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            points: PointsPolicy::default(),
        }
    }
}
