//! Core types for the Fasttify storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod store;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use store::{StoreId, StoreIdError};
