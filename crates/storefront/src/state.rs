//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::{BackgroundTasks, WithCache};
use crate::config::StorefrontConfig;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the HTTP client, the response cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    http: reqwest::Client,
    cache: WithCache,
    storefront: StorefrontClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// One `reqwest::Client` (connection pool) and one cache are shared by
    /// every upstream client.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let http = reqwest::Client::new();
        let cache = WithCache::new(config.cache_max_capacity, BackgroundTasks::new());
        let storefront = StorefrontClient::new(&config.shopify, http.clone(), cache.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                http,
                cache,
                storefront,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shared HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Get a reference to the shared response cache.
    #[must_use]
    pub fn cache(&self) -> &WithCache {
        &self.inner.cache
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Work scheduled to outlive its request (cache writes, revalidation).
    #[must_use]
    pub fn background(&self) -> &BackgroundTasks {
        self.inner.cache.background()
    }
}
