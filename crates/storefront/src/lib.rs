//! Fasttify Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod error;
pub mod fasttify;
pub mod middleware;
pub mod routes;
pub mod shopify;
pub mod state;
