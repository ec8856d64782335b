//! Fasttify Storefront Core - Shared types library.
//!
//! This crate provides common types used by the storefront components:
//! - `storefront` - Public-facing e-commerce site
//! - `integration-tests` - End-to-end scenarios against fake upstreams
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no caches.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for store identifiers, entity IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
