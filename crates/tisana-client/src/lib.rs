//! Client SDK for the tisana service.
//!
//! This crate provides a typed HTTP client for the tisana service's
//! service-to-service surface: balance checks, admin adjustments, order
//! completion/refund events and review bonuses.
//!
//! # Example
//!
//! ```no_run
//! use tisana_client::{OrderLine, TisanaClient};
//!
//! # async fn run() -> Result<(), tisana_client::ClientError> {
//! let client = TisanaClient::new("http://tisana:8080", "service-key");
//!
//! let result = client
//!     .complete_order(
//!         "wc-1001",
//!         "7f0f3c6e-9a1d-4d2a-8c3b-0b9a4c8e2d11",
//!         vec![OrderLine { product_id: "0b7c1d2e-3f40-4a51-b263-748596a0b1c2".into(), quantity: 1 }],
//!     )
//!     .await?;
//!
//! if !result.already_processed {
//!     println!("awarded {} points", result.points_awarded);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientOptions, TisanaClient};
pub use error::ClientError;
pub use types::{
    AdjustRequest, AdjustResponse, CheckPointsRequest, CheckPointsResponse, CommissionGrant,
    CompleteOrderRequest, CompleteOrderResponse, OrderLine, RefundRequest, RefundResponse,
    ReviewRequest, ReviewResponse,
};
