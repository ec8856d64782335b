//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean API separate from the raw query response
//! shapes in [`super::queries`].

use fasttify_storefront_core::CollectionId;
use serde::{Deserialize, Serialize};

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Product or collection image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Shopify image ID.
    pub id: Option<String>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

/// A collection as shown in the homepage hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    /// URL handle (`/collections/{handle}`).
    pub handle: String,
    pub image: Option<Image>,
}

/// A product summary from the recommended-products query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub id: String,
    pub title: String,
    pub handle: String,
    /// Lowest variant price.
    pub min_price: Money,
    /// First product image.
    pub image: Option<Image>,
}
