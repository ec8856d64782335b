//! Conversions from query response shapes to domain types.

use fasttify_storefront_core::CollectionId;

use super::queries::{featured_collection, recommended_products};
use crate::shopify::types::{Collection, Image, Money, RecommendedProduct};

fn convert_image(image: featured_collection::Image) -> Image {
    Image {
        id: image.id,
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

pub(super) fn convert_featured_collection(node: featured_collection::CollectionNode) -> Collection {
    Collection {
        id: CollectionId::new(node.id),
        title: node.title,
        handle: node.handle,
        image: node.image.map(convert_image),
    }
}

pub(super) fn convert_recommended_product(
    node: recommended_products::ProductNode,
) -> RecommendedProduct {
    let min = node.price_range.min_variant_price;
    RecommendedProduct {
        id: node.id,
        title: node.title,
        handle: node.handle,
        min_price: Money {
            amount: min.amount,
            currency_code: min.currency_code,
        },
        image: node.images.nodes.into_iter().next().map(convert_image),
    }
}
