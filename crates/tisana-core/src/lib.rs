//! Core types and utilities for tisana.
//!
//! This crate provides the foundational types used throughout the tisana
//! blend platform:
//!
//! - **Identifiers**: `UserId`, `MixId`, `IngredientId`, `PackagingId`,
//!   `ProductId`, `EntryId`
//! - **Accounts**: `UserAccount`
//! - **Ledger**: `PointsEntry`, `TransactionType`
//! - **Catalog**: `Ingredient`, `Packaging`
//! - **Mixes**: `Mix`, `MixComposition`, `MixStatus`
//! - **Totals**: `MixTotals`, `compute_totals`
//! - **Products**: `ShopProduct`, `ProductVisibility`
//!
//! # Units
//!
//! Money is stored as `i64` integer cents and points as `i64` whole points,
//! to avoid floating point precision issues. Weights are whole grams.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod mix;
pub mod product;
pub mod totals;

pub use account::UserAccount;
pub use catalog::{Ingredient, Packaging};
pub use error::{CoreError, Result};
pub use ids::{EntryId, IdError, IngredientId, MixId, PackagingId, ProductId, UserId};
pub use ledger::{PointsEntry, TransactionType};
pub use mix::{Mix, MixComposition, MixItem, MixStatus, WeightApplied};
pub use product::{ProductVisibility, ShopProduct};
pub use totals::{commission_points, compute_totals, MixTotals};
