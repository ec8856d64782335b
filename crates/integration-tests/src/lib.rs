//! Integration tests for the Fasttify storefront.
//!
//! Each test starts the real storefront router on a loopback port, pointed at
//! in-process fake upstreams, and talks to it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fasttify-storefront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_pages` - Rendered pages and failure behavior
//! - `upstream_cache` - Upstream call counts across requests

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use fasttify_storefront::config::{FasttifyConfig, ShopifyStorefrontConfig, StorefrontConfig};
use fasttify_storefront::routes;
use fasttify_storefront::state::AppState;
use fasttify_storefront_core::StoreId;
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

/// Store the pages show.
pub const STORE_ID: &str = "6c13a0d";

/// Shopify API version used by the fake GraphQL server.
pub const SHOPIFY_API_VERSION: &str = "2026-01";

/// A fake upstream server that counts its requests.
pub struct FakeUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    store_ids: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    /// Number of requests received so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `storeId` query values received, in order.
    #[must_use]
    pub fn store_ids(&self) -> Vec<String> {
        self.store_ids
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
struct FakeState {
    body: Arc<Value>,
    hits: Arc<AtomicUsize>,
    store_ids: Arc<Mutex<Vec<String>>>,
}

async fn store_products(
    State(fake): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    if let (Some(id), Ok(mut ids)) = (params.get("storeId"), fake.store_ids.lock()) {
        ids.push(id.clone());
    }
    Json((*fake.body).clone())
}

async fn graphql(State(fake): State<FakeState>) -> Json<Value> {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    Json((*fake.body).clone())
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server error");
    });
    addr
}

fn fake_state(body: Value) -> FakeState {
    FakeState {
        body: Arc::new(body),
        hits: Arc::new(AtomicUsize::new(0)),
        store_ids: Arc::new(Mutex::new(Vec::new())),
    }
}

fn upstream(addr: SocketAddr, state: &FakeState) -> FakeUpstream {
    FakeUpstream {
        addr,
        hits: Arc::clone(&state.hits),
        store_ids: Arc::clone(&state.store_ids),
    }
}

/// Start a fake Fasttify API that answers every request with `body`.
pub async fn fake_fasttify(body: Value) -> FakeUpstream {
    let state = fake_state(body);
    let router = Router::new()
        .route("/dev/get-store-products", get(store_products))
        .with_state(state.clone());
    upstream(serve(router).await, &state)
}

/// Start a fake Shopify Storefront API that answers every query with `body`.
pub async fn fake_shopify(body: Value) -> FakeUpstream {
    let state = fake_state(body);
    let router = Router::new()
        .route(
            &format!("/api/{SHOPIFY_API_VERSION}/graphql.json"),
            post(graphql),
        )
        .with_state(state.clone());
    upstream(serve(router).await, &state)
}

/// A loopback address nothing listens on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    listener.local_addr().expect("Listener has no address")
}

/// GraphQL body with one featured collection.
#[must_use]
pub fn featured_collection_body(title: &str, handle: &str) -> Value {
    json!({"data": {"collections": {"nodes": [{
        "id": "gid://shopify/Collection/1",
        "title": title,
        "handle": handle,
        "image": {
            "id": "gid://shopify/CollectionImage/1",
            "url": "https://cdn.shopify.com/collection.png",
            "altText": title,
            "width": 1200,
            "height": 800
        }
    }]}}})
}

/// GraphQL body for a store without collections.
#[must_use]
pub fn no_collections_body() -> Value {
    json!({"data": {"collections": {"nodes": []}}})
}

/// Fasttify body with a single product.
#[must_use]
pub fn single_product_body(name: &str, price: u64) -> Value {
    json!({"products": [{
        "id": "prod-1",
        "storeId": STORE_ID,
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "compareAtPrice": null,
        "images": []
    }]})
}

/// A running storefront.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub state: AppState,
}

impl TestContext {
    /// Start the storefront against the given upstreams.
    pub async fn start(fasttify: SocketAddr, shopify: SocketAddr) -> Self {
        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            brand: "Hydrogen".to_string(),
            shopify: ShopifyStorefrontConfig {
                store: format!("http://{shopify}"),
                api_version: SHOPIFY_API_VERSION.to_string(),
                storefront_private_token: SecretString::from("9d2f6b1c84e07a3f5c6e1b8d2a7f4e90"),
            },
            fasttify: FasttifyConfig {
                api_url: Url::parse(&format!("http://{fasttify}")).expect("Invalid fake URL"),
                store_id: StoreId::parse(STORE_ID).expect("Invalid store id"),
            },
            cache_max_capacity: 100,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let state = AppState::new(config);
        let addr = serve(routes::app(state.clone())).await;

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// GET a path and return status and body text.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("Failed to send request");
        let status = resp.status();
        let body = resp.text().await.expect("Failed to read response");
        (status, body)
    }

    /// Wait for background cache writes and revalidation to finish.
    pub async fn settle(&self) {
        self.state.background().flush().await;
    }
}
