//! Tisana HTTP API Service.
//!
//! This crate provides the HTTP API for the tisana blend platform,
//! including:
//!
//! - Account registration and the points ledger
//! - Mix builder CRUD with capacity-clamped weight edits
//! - Publishing and purchasing mixes as shop products
//! - Order completion awards, refunds and review bonuses
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **User JWTs** (HS256) - For end-user requests from the storefront
//! 2. **Service API keys** - For service-to-service requests (order events,
//!    catalog maintenance, admin adjustments)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod routes;
pub mod state;

pub use config::{PointsPolicy, ServiceConfig};
pub use error::ApiError;
pub use notify::{AdminEvent, AdminNotifier};
pub use routes::create_router;
pub use state::AppState;
