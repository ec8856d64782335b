//! Cached-fetch facility for upstream JSON APIs.
//!
//! # Architecture
//!
//! - In-memory store via `moka`, each entry expiring after its strategy's TTL
//! - Entries keyed by an ordered tuple of string parts (e.g.
//!   `["fasttify", "products", storeId]`), stored under its JSON encoding
//! - Only success-status responses are stored, and a per-call predicate may
//!   reject them further; rejected responses are returned to the caller but
//!   never cached
//! - Cache writes and stale-while-revalidate refreshes run on
//!   [`BackgroundTasks`] so the caller never waits on them

mod background;
mod strategy;

pub use background::BackgroundTasks;
pub use strategy::{CacheStrategy, Freshness};

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Ordered tuple identifying a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Build a key from its parts.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// The key parts in order.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// JSON encoding used as the store key, e.g. `["fasttify","products","6c13a0d"]`.
    #[must_use]
    pub fn encoded(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| self.0.join("\u{1f}"))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded())
    }
}

/// A stored response body.
#[derive(Debug, Clone)]
struct CacheEntry {
    body: Arc<Value>,
    stored_at: Instant,
    strategy: CacheStrategy,
}

/// An upstream body together with the HTTP status it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamResponse {
    #[must_use]
    pub const fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Whether the cache may store this response under `should_cache`.
    fn is_storable(&self, should_cache: impl FnOnce(&Value) -> bool) -> bool {
        self.status.is_success() && should_cache(&self.body)
    }
}

/// Bodies from fetchers that fail on non-success statuses themselves.
impl From<Value> for UpstreamResponse {
    fn from(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

/// A cache hit with its freshness at lookup time.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Arc<Value>,
    pub freshness: Freshness,
}

/// Per-entry expiry: each entry lives for its own strategy's TTL.
struct StrategyExpiry;

impl Expiry<String, CacheEntry> for StrategyExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.strategy.ttl())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.strategy.ttl())
    }
}

/// Cache handle shared by all upstream clients.
///
/// Cheap to clone; clones share the same store and background tracker.
#[derive(Clone)]
pub struct WithCache {
    store: Cache<String, CacheEntry>,
    background: BackgroundTasks,
}

impl WithCache {
    /// Create a cache holding at most `max_capacity` responses.
    #[must_use]
    pub fn new(max_capacity: u64, background: BackgroundTasks) -> Self {
        let store = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(StrategyExpiry)
            .build();

        Self { store, background }
    }

    /// The wait-until hook used for work that outlives a request.
    #[must_use]
    pub const fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    /// Look up a stored response.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        let entry = self.store.get(&key.encoded()).await?;
        let freshness = entry.strategy.freshness(entry.stored_at.elapsed());

        if freshness == Freshness::Expired {
            return None;
        }

        Some(CachedResponse {
            body: entry.body,
            freshness,
        })
    }

    /// Store a response under `key` for the strategy's TTL.
    ///
    /// Concurrent writers for the same key overwrite each other.
    pub async fn set(&self, key: &CacheKey, body: Arc<Value>, strategy: CacheStrategy) {
        if strategy.no_store {
            return;
        }

        self.store
            .insert(
                key.encoded(),
                CacheEntry {
                    body,
                    stored_at: Instant::now(),
                    strategy,
                },
            )
            .await;
    }

    /// Fetch a JSON body through the cache.
    ///
    /// - Fresh hit: returned without calling `fetch`.
    /// - Stale hit: returned immediately; `fetch` runs in the background and
    ///   replaces the entry if the new response is storable.
    /// - Miss: `fetch` runs now; the body is returned and, if storable,
    ///   written to the store in the background.
    ///
    /// A response is storable when its status is a success and
    /// `should_cache` accepts its body.
    ///
    /// # Errors
    ///
    /// Returns whatever error `fetch` returns on a miss. Errors during a
    /// background revalidation are logged and the stale entry is kept.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn fetch_json<F, Fut, R, P, E>(
        &self,
        key: CacheKey,
        strategy: CacheStrategy,
        should_cache: P,
        fetch: F,
    ) -> Result<Arc<Value>, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Into<UpstreamResponse> + Send + 'static,
        P: FnOnce(&Value) -> bool + Send + 'static,
        E: Display + Send + 'static,
    {
        if strategy.no_store {
            return fetch().await.map(|r| Arc::new(r.into().body));
        }

        if let Some(cached) = self.get(&key).await {
            if cached.freshness == Freshness::Stale {
                debug!("Cache stale, revalidating in background");
                let this = self.clone();
                self.background.spawn(async move {
                    match fetch().await {
                        Ok(response) => {
                            let response: UpstreamResponse = response.into();
                            if response.is_storable(should_cache) {
                                this.set(&key, Arc::new(response.body), strategy).await;
                            } else {
                                debug!(
                                    status = %response.status,
                                    "Revalidated response not storable"
                                );
                            }
                        }
                        Err(e) => warn!(error = %e, "Background revalidation failed"),
                    }
                });
            } else {
                debug!("Cache hit");
            }
            return Ok(cached.body);
        }

        debug!("Cache miss");
        let response: UpstreamResponse = fetch().await?.into();
        let storable = response.is_storable(should_cache);
        let body = Arc::new(response.body);

        if storable {
            let this = self.clone();
            let stored = Arc::clone(&body);
            self.background.spawn(async move {
                this.set(&key, stored, strategy).await;
            });
        } else {
            debug!(status = %response.status, "Response not storable");
        }

        Ok(body)
    }
}
