//! Product listing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::Result;
use crate::fasttify::{FasttifyClient, FasttifyProduct};
use crate::state::AppState;

/// Image display data for templates.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Listing item display data.
///
/// Prices are shown as the raw numbers the store entered.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub name: String,
    pub description: String,
    pub price: String,
    /// Empty when the product has no prior price.
    pub compare_at_price: String,
    pub image: Option<ImageView>,
}

impl From<&FasttifyProduct> for ProductView {
    fn from(product: &FasttifyProduct) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            compare_at_price: product
                .compare_at_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            image: product.first_image().map(|img| ImageView {
                url: img.url,
                alt: img.alt,
            }),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub title: String,
    pub products: Vec<ProductView>,
}

/// Display product listing page.
///
/// The product fetch is critical: any failure fails the page.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    fasttify: FasttifyClient,
) -> Result<ProductsIndexTemplate> {
    let products = fasttify
        .fetch_products(&state.config().fasttify.store_id)
        .await?;

    Ok(ProductsIndexTemplate {
        title: format!("{} | Products", state.config().brand),
        products: products.iter().map(ProductView::from).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fasttify::ProductImages;

    #[test]
    fn test_product_view_prices() {
        let product = FasttifyProduct {
            name: "Shirt".to_string(),
            price: 19.99,
            compare_at_price: Some(25000.0),
            ..FasttifyProduct::default()
        };

        let view = ProductView::from(&product);
        assert_eq!(view.price, "19.99");
        assert_eq!(view.compare_at_price, "25000");
        assert!(view.image.is_none());
    }

    #[test]
    fn test_listing_renders_items() {
        let products = [
            FasttifyProduct {
                name: "Shirt".to_string(),
                description: "Cotton".to_string(),
                price: 20000.0,
                ..FasttifyProduct::default()
            },
            FasttifyProduct {
                name: "Mug".to_string(),
                price: 15000.0,
                images: ProductImages::Encoded(
                    r#"[{"url":"https://cdn.example/mug.png","alt":""}]"#.to_string(),
                ),
                ..FasttifyProduct::default()
            },
        ];

        let html = ProductsIndexTemplate {
            title: "Hydrogen | Products".to_string(),
            products: products.iter().map(ProductView::from).collect(),
        }
        .render()
        .unwrap();

        assert!(html.contains("<title>Hydrogen | Products</title>"));
        assert!(html.contains("<h1>Productos de Fasttify</h1>"));
        assert!(html.contains("<h2>Shirt</h2>"));
        assert!(html.contains("<p>Cotton</p>"));
        assert!(html.contains("Precio: 20000 - Precio anterior: </p>"));
        assert!(html.contains(r#"src="https://cdn.example/mug.png" alt="Mug""#));
        assert_eq!(html.matches("<img").count(), 1);
    }
}
