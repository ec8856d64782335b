//! Home page route handler.
//!
//! The page is streamed in three chunks:
//!
//! 1. Everything up to the recommended-products section, including the
//!    "Cargando productos..." placeholder, sent once the featured collection
//!    has loaded.
//! 2. The recommended products (or "No se encontraron productos"), sent when
//!    the deferred Fasttify fetch settles.
//! 3. The rest of the document.

use std::convert::Infallible;

use askama::Template;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use fasttify_storefront_core::{CurrencyCode, Price, StoreId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::fasttify::{FasttifyClient, FasttifyProduct};
use crate::routes::deferred::Deferred;
use crate::shopify::types::Collection;
use crate::state::AppState;

/// Placeholder comment where the deferred section is spliced into the stream.
pub const DEFERRED_MARKER: &str = "<!--deferred:recommended-products-->";

// =============================================================================
// Views
// =============================================================================

/// Image display data for templates.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Featured collection display data.
#[derive(Debug, Clone)]
pub struct CollectionView {
    pub title: String,
    pub href: String,
    pub image: Option<ImageView>,
}

impl From<Collection> for CollectionView {
    fn from(collection: Collection) -> Self {
        let image = collection.image.map(|img| ImageView {
            alt: img.alt_text.unwrap_or_else(|| collection.title.clone()),
            url: img.url,
        });

        Self {
            href: format!("/collections/{}", urlencoding::encode(&collection.handle)),
            title: collection.title,
            image,
        }
    }
}

/// Recommended product card display data.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub href: String,
    pub name: String,
    pub price: String,
    pub image: Option<ImageView>,
}

impl From<&FasttifyProduct> for ProductCardView {
    fn from(product: &FasttifyProduct) -> Self {
        let price = Price::from_f64(product.price, CurrencyCode::COP)
            .map_or_else(|| product.price.to_string(), |p| p.to_string());

        Self {
            id: product.id.to_string(),
            href: format!("/products/{}", urlencoding::encode(product.id.as_str())),
            name: product.name.clone(),
            price,
            image: product.first_image().map(|img| ImageView {
                url: img.url,
                alt: img.alt,
            }),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Home page template.
///
/// Rendered whole, then split at [`DEFERRED_MARKER`].
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub title: String,
    pub featured_collection: Option<CollectionView>,
    pub deferred_marker: &'static str,
}

/// Recommended products fragment, streamed after the page head.
#[derive(Template)]
#[template(path = "partials/recommended_products.html")]
pub struct RecommendedProductsTemplate {
    /// `None` when the products could not be loaded.
    pub products: Option<Vec<ProductCardView>>,
}

impl RecommendedProductsTemplate {
    /// Build the fragment from deferred data.
    #[must_use]
    pub fn new(products: Option<&[FasttifyProduct]>) -> Self {
        Self {
            products: products.map(|list| list.iter().map(ProductCardView::from).collect()),
        }
    }
}

// =============================================================================
// Loaders
// =============================================================================

/// Data needed before anything is sent. Failure fails the page.
pub struct CriticalData {
    pub featured_collection: Option<Collection>,
}

/// Load the featured collection.
///
/// # Errors
///
/// Returns an error if the Storefront query fails.
pub async fn load_critical_data(state: &AppState) -> Result<CriticalData> {
    let featured_collection = state.storefront().featured_collection().await?;
    Ok(CriticalData {
        featured_collection,
    })
}

/// Start loading the recommended products without waiting for them.
pub fn load_deferred_data(
    fasttify: FasttifyClient,
    store_id: StoreId,
) -> Deferred<Vec<FasttifyProduct>> {
    Deferred::spawn("fasttify_products", async move {
        fasttify.fetch_products(&store_id).await
    })
}

// =============================================================================
// Handler
// =============================================================================

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, fasttify: FasttifyClient) -> Result<Response> {
    // Started first so it runs while the critical query is in flight
    let deferred = load_deferred_data(fasttify, state.config().fasttify.store_id.clone());

    let critical = load_critical_data(&state).await?;

    let page = HomeTemplate {
        title: format!("{} | Home", state.config().brand),
        featured_collection: critical.featured_collection.map(CollectionView::from),
        deferred_marker: DEFERRED_MARKER,
    }
    .render()
    .map_err(|e| AppError::Internal(format!("home template: {e}")))?;

    let (head, tail) = page
        .split_once(DEFERRED_MARKER)
        .map(|(head, tail)| (head.to_string(), tail.to_string()))
        .ok_or_else(|| AppError::Internal("home template has no deferred marker".to_string()))?;

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Bytes::from(head));

        let products = deferred.resolve().await;
        let section = RecommendedProductsTemplate::new(products.as_deref())
            .render()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to render recommended products");
                String::new()
            });
        yield Ok(Bytes::from(section));

        yield Ok(Bytes::from(tail));
    };

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fasttify::{ProductImage, ProductImages};
    use crate::shopify::types::Image;

    fn shirt() -> FasttifyProduct {
        FasttifyProduct {
            id: "p-1".into(),
            name: "Shirt".to_string(),
            price: 20000.0,
            images: ProductImages::Decoded(vec![ProductImage {
                url: "https://cdn.example/shirt.png".to_string(),
                alt: String::new(),
            }]),
            ..FasttifyProduct::default()
        }
    }

    #[test]
    fn test_product_card_view() {
        let card = ProductCardView::from(&shirt());
        assert_eq!(card.href, "/products/p-1");
        assert_eq!(card.price, "COP 20,000.00");
        assert_eq!(card.image.unwrap().alt, "Shirt");
    }

    #[test]
    fn test_product_card_href_is_encoded() {
        let product = FasttifyProduct {
            id: "a b/c".into(),
            ..FasttifyProduct::default()
        };
        assert_eq!(ProductCardView::from(&product).href, "/products/a%20b%2Fc");
    }

    #[test]
    fn test_home_template_contains_marker_after_placeholder() {
        let html = HomeTemplate {
            title: "Hydrogen | Home".to_string(),
            featured_collection: None,
            deferred_marker: DEFERRED_MARKER,
        }
        .render()
        .unwrap();

        let (head, tail) = html.split_once(DEFERRED_MARKER).unwrap();
        assert!(head.contains("<title>Hydrogen | Home</title>"));
        assert!(head.contains("Productos Recomendados"));
        assert!(head.contains("Cargando productos..."));
        assert!(!head.contains("featured-collection"));
        assert!(tail.contains("</html>"));
    }

    #[test]
    fn test_home_template_featured_collection() {
        let collection = Collection {
            id: "gid://shopify/Collection/1".into(),
            title: "Summer".to_string(),
            handle: "summer".to_string(),
            image: Some(Image {
                id: None,
                url: "https://cdn.shopify.com/s.png".to_string(),
                alt_text: None,
                width: Some(800),
                height: Some(600),
            }),
        };

        let html = HomeTemplate {
            title: "Hydrogen | Home".to_string(),
            featured_collection: Some(CollectionView::from(collection)),
            deferred_marker: DEFERRED_MARKER,
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"href="/collections/summer""#));
        assert!(html.contains("<h1>Summer</h1>"));
        assert!(html.contains(r#"src="https://cdn.shopify.com/s.png""#));
    }

    #[test]
    fn test_recommended_products_fragment() {
        let products = vec![shirt()];
        let html = RecommendedProductsTemplate::new(Some(products.as_slice()))
            .render()
            .unwrap();

        assert!(html.contains(r#"href="/products/p-1""#));
        assert!(html.contains(r#"id="img-p-1""#));
        assert!(html.contains("<h4>Shirt</h4>"));
        assert!(html.contains("COP 20,000.00"));
        assert!(!html.contains("No se encontraron productos"));
    }

    #[test]
    fn test_recommended_products_unavailable() {
        let html = RecommendedProductsTemplate::new(None).render().unwrap();
        assert!(html.contains("No se encontraron productos"));
    }

    #[test]
    fn test_recommended_products_empty_list_renders_empty_grid() {
        let html = RecommendedProductsTemplate::new(Some(&[][..])).render().unwrap();
        assert!(html.contains("recommended-products-grid"));
        assert!(!html.contains("No se encontraron productos"));
    }
}
