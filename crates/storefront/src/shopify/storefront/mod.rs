//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` query envelopes with `reqwest` 0.13 for HTTP.
//! Responses go through the shared cache with the short strategy.
//!
//! No page calls [`StorefrontClient::recommended_products`] yet; the homepage
//! takes its recommended products from Fasttify.

mod conversions;
pub mod queries;

use std::sync::Arc;

use graphql_client::{GraphQLQuery, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::cache::{CacheKey, CacheStrategy, WithCache};
use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{Collection, RecommendedProduct};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use conversions::{convert_featured_collection, convert_recommended_product};
use queries::{FeaturedCollection, RecommendedProducts, featured_collection, recommended_products};

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    cache: WithCache,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig, client: reqwest::Client, cache: WithCache) -> Self {
        Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: config.endpoint(),
                access_token: config.storefront_private_token.clone(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL query through the cache.
    ///
    /// Only responses with data and without GraphQL errors are cached.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
        strategy: CacheStrategy,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);
        let operation_name = request_body.operation_name;
        let payload = serde_json::to_value(&request_body)?;

        let key = CacheKey::new([
            "shopify".to_string(),
            "storefront".to_string(),
            operation_name.to_string(),
            payload["variables"].to_string(),
        ]);

        let client = self.inner.client.clone();
        let endpoint = self.inner.endpoint.clone();
        let access_token = self.inner.access_token.clone();

        let body = self
            .inner
            .cache
            .fetch_json(key, strategy, is_cacheable_graphql_response, move || {
                post_graphql(client, endpoint, access_token, payload)
            })
            .await?;

        let response = Response::<Q::ResponseData>::deserialize(body.as_ref()).map_err(|e| {
            tracing::error!(
                error = %e,
                operation = operation_name,
                "Failed to parse Shopify GraphQL response"
            );
            ShopifyError::Parse(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = operation_name,
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get the most recently updated collection.
    ///
    /// Returns `Ok(None)` when the store has no collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns GraphQL errors.
    #[instrument(skip(self))]
    pub async fn featured_collection(&self) -> Result<Option<Collection>, ShopifyError> {
        let data = self
            .execute::<FeaturedCollection>(
                featured_collection::Variables::default(),
                CacheStrategy::short(),
            )
            .await?;

        Ok(data
            .collections
            .nodes
            .into_iter()
            .next()
            .map(convert_featured_collection))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the four most recently updated products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns GraphQL errors.
    #[instrument(skip(self))]
    pub async fn recommended_products(&self) -> Result<Vec<RecommendedProduct>, ShopifyError> {
        let data = self
            .execute::<RecommendedProducts>(
                recommended_products::Variables::default(),
                CacheStrategy::short(),
            )
            .await?;

        Ok(data
            .products
            .nodes
            .into_iter()
            .map(convert_recommended_product)
            .collect())
    }
}

/// POST a GraphQL payload and return the raw JSON response.
async fn post_graphql(
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    payload: Value,
) -> Result<Value, ShopifyError> {
    let response = client
        .post(&endpoint)
        // Private access tokens use a different header than public tokens
        .header(
            "Shopify-Storefront-Private-Token",
            access_token.expose_secret(),
        )
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ShopifyError::RateLimited(retry_after));
    }

    // Body as text first for better error diagnostics
    let response_text = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %response_text.chars().take(500).collect::<String>(),
            "Shopify API returned non-success status"
        );
        return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
            "HTTP {status}: {}",
            response_text.chars().take(200).collect::<String>()
        ))]));
    }

    serde_json::from_str(&response_text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %response_text.chars().take(500).collect::<String>(),
            "Shopify response is not JSON"
        );
        ShopifyError::Parse(e)
    })
}

/// Cache predicate: data present and no GraphQL errors.
fn is_cacheable_graphql_response(body: &Value) -> bool {
    let has_errors = body
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| !errors.is_empty());
    let has_data = body.get("data").is_some_and(|data| !data.is_null());

    has_data && !has_errors
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => Value::String(s),
                    graphql_client::PathFragment::Index(i) => Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::cache::BackgroundTasks;

    #[derive(Clone)]
    struct FakeShopify {
        hits: Arc<AtomicUsize>,
        status: StatusCode,
        body: Arc<Value>,
    }

    async fn graphql(
        State(fake): State<FakeShopify>,
        headers: HeaderMap,
        Json(payload): Json<Value>,
    ) -> impl IntoResponse {
        assert_eq!(
            headers.get("Shopify-Storefront-Private-Token").unwrap(),
            "3f9c1e7ab24d8065fe1b9c7d2a4e6f80"
        );
        assert!(payload["query"].is_string());
        fake.hits.fetch_add(1, Ordering::SeqCst);
        (fake.status, Json((*fake.body).clone()))
    }

    async fn spawn_shopify(status: StatusCode, body: Value) -> (SocketAddr, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/api/2026-01/graphql.json", post(graphql))
            .with_state(FakeShopify {
                hits: Arc::clone(&hits),
                status,
                body: Arc::new(body),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, hits)
    }

    fn client_for(addr: SocketAddr) -> StorefrontClient {
        let config = ShopifyStorefrontConfig {
            store: format!("http://{addr}"),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from("3f9c1e7ab24d8065fe1b9c7d2a4e6f80"),
        };
        StorefrontClient::new(
            &config,
            reqwest::Client::new(),
            WithCache::new(100, BackgroundTasks::new()),
        )
    }

    #[test]
    fn test_cacheable_graphql_response() {
        assert!(is_cacheable_graphql_response(&json!({"data": {}})));
        assert!(is_cacheable_graphql_response(&json!({"data": {}, "errors": []})));
        assert!(!is_cacheable_graphql_response(
            &json!({"data": {}, "errors": [{"message": "x"}]})
        ));
        assert!(!is_cacheable_graphql_response(&json!({"data": null})));
    }

    #[tokio::test]
    async fn test_featured_collection() {
        let (addr, hits) = spawn_shopify(
            StatusCode::OK,
            json!({"data": {"collections": {"nodes": [{
                "id": "gid://shopify/Collection/1",
                "title": "Summer",
                "handle": "summer",
                "image": {"id": "img1", "url": "https://cdn.shopify.com/s.png", "altText": "Beach", "width": 800, "height": 600}
            }]}}}),
        )
        .await;
        let client = client_for(addr);

        let collection = client.featured_collection().await.unwrap().unwrap();
        assert_eq!(collection.title, "Summer");
        assert_eq!(collection.handle, "summer");
        assert_eq!(
            collection.image.unwrap().alt_text.as_deref(),
            Some("Beach")
        );

        client.inner.cache.background().flush().await;
        client.featured_collection().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_featured_collection_empty_store() {
        let (addr, _hits) = spawn_shopify(
            StatusCode::OK,
            json!({"data": {"collections": {"nodes": []}}}),
        )
        .await;

        let collection = client_for(addr).featured_collection().await.unwrap();
        assert!(collection.is_none());
    }

    #[tokio::test]
    async fn test_graphql_errors_are_returned_and_not_cached() {
        let (addr, hits) = spawn_shopify(
            StatusCode::OK,
            json!({"errors": [{"message": "Access denied", "locations": [{"line": 1, "column": 2}]}]}),
        )
        .await;
        let client = client_for(addr);

        for _ in 0..2 {
            let err = client.featured_collection().await.unwrap_err();
            assert!(matches!(err, ShopifyError::GraphQL(_)));
            assert!(err.to_string().contains("Access denied"));
            client.inner.cache.background().flush().await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (addr, _hits) =
            spawn_shopify(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "boom"})).await;

        let err = client_for(addr).featured_collection().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let (addr, _hits) = spawn_shopify(StatusCode::TOO_MANY_REQUESTS, json!({})).await;

        let err = client_for(addr).featured_collection().await.unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(1)));
    }

    #[tokio::test]
    async fn test_recommended_products() {
        let (addr, _hits) = spawn_shopify(
            StatusCode::OK,
            json!({"data": {"products": {"nodes": [{
                "id": "gid://shopify/Product/9",
                "title": "Hat",
                "handle": "hat",
                "priceRange": {"minVariantPrice": {"amount": "25.0", "currencyCode": "USD"}},
                "images": {"nodes": []}
            }]}}}),
        )
        .await;

        let products = client_for(addr).recommended_products().await.unwrap();
        assert_eq!(products.len(), 1);
        let hat = products.first().unwrap();
        assert_eq!(hat.title, "Hat");
        assert_eq!(hat.min_price.amount, "25.0");
        assert!(hat.image.is_none());
    }
}
