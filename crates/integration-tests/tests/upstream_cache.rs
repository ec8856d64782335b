//! Integration tests for upstream response caching.
//!
//! Cache writes happen in the background, so tests call
//! [`TestContext::settle`] before the request that should hit the cache.

use fasttify_storefront_integration_tests::{
    TestContext, fake_fasttify, fake_shopify, featured_collection_body, no_collections_body,
    single_product_body, unreachable_addr,
};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_products_fetched_once_per_cache_entry() {
    let fasttify = fake_fasttify(single_product_body("Shirt", 20000)).await;
    let ctx = TestContext::start(fasttify.addr, unreachable_addr().await).await;

    let (status, _) = ctx.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    ctx.settle().await;

    let (status, body) = ctx.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h2>Shirt</h2>"));
    assert_eq!(fasttify.hits(), 1);
}

#[tokio::test]
async fn test_home_and_listing_share_cache_entry() {
    let fasttify = fake_fasttify(single_product_body("Shirt", 20000)).await;
    let shopify = fake_shopify(no_collections_body()).await;
    let ctx = TestContext::start(fasttify.addr, shopify.addr).await;

    let (status, _) = ctx.get("/").await;
    assert_eq!(status, StatusCode::OK);
    ctx.settle().await;

    let (status, _) = ctx.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fasttify.hits(), 1);
}

#[tokio::test]
async fn test_error_response_is_not_cached() {
    let fasttify = fake_fasttify(json!({"products": [], "error": "store not found"})).await;
    let ctx = TestContext::start(fasttify.addr, unreachable_addr().await).await;

    for _ in 0..2 {
        let (status, body) = ctx.get("/products").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("<li>").count(), 0);
        ctx.settle().await;
    }

    assert_eq!(fasttify.hits(), 2);
}

#[tokio::test]
async fn test_featured_collection_query_is_cached() {
    let fasttify = fake_fasttify(json!({"products": []})).await;
    let shopify = fake_shopify(featured_collection_body("Summer", "summer")).await;
    let ctx = TestContext::start(fasttify.addr, shopify.addr).await;

    for _ in 0..2 {
        let (status, body) = ctx.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Summer</h1>"));
        ctx.settle().await;
    }

    assert_eq!(shopify.hits(), 1);
}

#[tokio::test]
async fn test_graphql_errors_are_not_cached() {
    let fasttify = fake_fasttify(json!({"products": []})).await;
    let shopify = fake_shopify(json!({"errors": [{"message": "Throttled"}]})).await;
    let ctx = TestContext::start(fasttify.addr, shopify.addr).await;

    for _ in 0..2 {
        let (status, _) = ctx.get("/").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        ctx.settle().await;
    }

    assert_eq!(shopify.hits(), 2);
}
