//! Fasttify product API client.
//!
//! # Architecture
//!
//! - One endpoint: `GET {base}/dev/get-store-products?storeId=<id>`
//! - Responses flow through [`WithCache`] under
//!   `["fasttify", "products", storeId]` with [`CacheStrategy::long`]
//! - Non-success statuses and bodies carrying a non-empty `error` are
//!   returned but never cached
//! - A body without a `products` list degrades to an empty list; only
//!   transport and decoding failures are errors
//! - Every object in the list is kept, whatever its field types
//!
//! # Example
//!
//! ```rust,ignore
//! async fn handler(fasttify: FasttifyClient) -> Result<()> {
//!     let store_id = StoreId::parse("6c13a0d")?;
//!     let products = fasttify.fetch_products(&store_id).await?;
//!     Ok(())
//! }
//! ```

mod types;

pub use types::{FasttifyProduct, ProductImage, ProductImages};

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fasttify_storefront_core::StoreId;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, instrument, warn};

use crate::cache::{CacheKey, CacheStrategy, UpstreamResponse, WithCache};
use crate::config::FasttifyConfig;
use crate::middleware::RequestContext;
use crate::state::AppState;

/// Path of the store-products endpoint relative to the API base URL.
pub const STORE_PRODUCTS_PATH: &str = "/dev/get-store-products";

/// Errors that can occur when calling the Fasttify API.
#[derive(Debug, Error)]
pub enum FasttifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the Fasttify product API, scoped to one incoming request.
///
/// Built per request by its [`FromRequestParts`] implementation from the
/// shared HTTP client, the shared cache, and the request context. Cloning is
/// cheap.
#[derive(Clone)]
pub struct FasttifyClient {
    http: reqwest::Client,
    endpoint: Arc<str>,
    cache: WithCache,
    request: RequestContext,
}

impl FasttifyClient {
    /// Create a client.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        config: &FasttifyConfig,
        cache: WithCache,
        request: RequestContext,
    ) -> Self {
        let endpoint = format!(
            "{}{STORE_PRODUCTS_PATH}",
            config.api_url.as_str().trim_end_matches('/')
        );

        Self {
            http,
            endpoint: endpoint.into(),
            cache,
            request,
        }
    }

    /// Get the products of a store.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON. A JSON
    /// body without a `products` list yields `Ok(vec![])`.
    #[instrument(
        skip(self),
        fields(
            store_id = %store_id,
            request_id = %self.request.request_id,
            path = %self.request.path
        )
    )]
    pub async fn fetch_products(
        &self,
        store_id: &StoreId,
    ) -> Result<Vec<FasttifyProduct>, FasttifyError> {
        let key = CacheKey::new(["fasttify", "products", store_id.as_str()]);
        let http = self.http.clone();
        let endpoint = Arc::clone(&self.endpoint);
        let store = store_id.to_string();

        let body = self
            .cache
            .fetch_json(
                key,
                CacheStrategy::long(),
                should_cache_products,
                move || fetch_store_products(http, endpoint, store),
            )
            .await?;

        Ok(extract_products(&body))
    }
}

impl FromRequestParts<AppState> for FasttifyClient {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request = RequestContext::from_parts(parts);

        Ok(Self::new(
            state.http().clone(),
            &state.config().fasttify,
            state.cache().clone(),
            request,
        ))
    }
}

/// Perform the upstream GET and parse the body as JSON.
///
/// Non-success statuses are not errors: the body is still forwarded to the
/// list-shape check, but the status keeps it out of the cache.
async fn fetch_store_products(
    http: reqwest::Client,
    endpoint: Arc<str>,
    store_id: String,
) -> Result<UpstreamResponse, FasttifyError> {
    let response = http
        .get(endpoint.as_ref())
        .query(&[("storeId", store_id.as_str())])
        .header(CONTENT_TYPE, "application/json")
        .send()
        .await?;

    let status = response.status();
    let response_text = response.text().await?;

    if !status.is_success() {
        warn!(
            status = %status,
            body = %truncate(&response_text),
            "Fasttify API returned non-success status"
        );
    }

    let body = serde_json::from_str(&response_text).map_err(|e| {
        error!(
            error = %e,
            body = %truncate(&response_text),
            "Failed to parse Fasttify response"
        );
        FasttifyError::Parse(e)
    })?;

    Ok(UpstreamResponse::new(status, body))
}

/// Cache predicate for store-products responses.
///
/// Accepts a body whose `error` field is absent or empty. Emptiness follows
/// the API's loose typing: `null`, `false`, `0`, `""` and `[]` all count as
/// no error.
#[must_use]
pub fn should_cache_products(body: &Value) -> bool {
    match body.get("error") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(_)) => false,
    }
}

/// Pull the product list out of a response body.
///
/// Logs and returns an empty list when `products` is missing or not a list.
/// List items that are not objects are skipped.
fn extract_products(body: &Value) -> Vec<FasttifyProduct> {
    let Some(items) = body.get("products").and_then(Value::as_array) else {
        error!(
            body = %truncate(&body.to_string()),
            "No products found or invalid format"
        );
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            if !item.is_object() {
                warn!(
                    item = %truncate(&item.to_string()),
                    "Skipping product record that is not an object"
                );
                return None;
            }
            FasttifyProduct::deserialize(item)
                .inspect_err(|e| warn!(error = %e, "Skipping unreadable product record"))
                .ok()
        })
        .collect()
}

fn truncate(text: &str) -> String {
    text.chars().take(500).collect()
}
