//! GraphQL query definitions for the Shopify Storefront API.
//!
//! Each query gets a unit struct implementing [`GraphQLQuery`] and a
//! snake_case module holding its `Variables` and `ResponseData`, the same
//! layout `#[derive(GraphQLQuery)]` generates.

use graphql_client::{GraphQLQuery, QueryBody};

// =============================================================================
// FeaturedCollection
// =============================================================================

/// Most recently updated collection, shown in the homepage hero.
pub struct FeaturedCollection;

pub mod featured_collection {
    use serde::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "FeaturedCollection";
    pub const QUERY: &str = r"fragment FeaturedCollection on Collection {
  id
  title
  image {
    id
    url
    altText
    width
    height
  }
  handle
}
query FeaturedCollection($country: CountryCode, $language: LanguageCode)
  @inContext(country: $country, language: $language) {
  collections(first: 1, sortKey: UPDATED_AT, reverse: true) {
    nodes {
      ...FeaturedCollection
    }
  }
}
";

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub country: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub language: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: Collections,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Collections {
        pub nodes: Vec<CollectionNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CollectionNode {
        pub id: String,
        pub title: String,
        pub image: Option<Image>,
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Image {
        pub id: Option<String>,
        pub url: String,
        pub alt_text: Option<String>,
        pub width: Option<i64>,
        pub height: Option<i64>,
    }
}

impl GraphQLQuery for FeaturedCollection {
    type Variables = featured_collection::Variables;
    type ResponseData = featured_collection::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: featured_collection::QUERY,
            operation_name: featured_collection::OPERATION_NAME,
        }
    }
}

// =============================================================================
// RecommendedProducts
// =============================================================================

/// Four most recently updated products.
pub struct RecommendedProducts;

pub mod recommended_products {
    use serde::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "RecommendedProducts";
    pub const QUERY: &str = r"fragment RecommendedProduct on Product {
  id
  title
  handle
  priceRange {
    minVariantPrice {
      amount
      currencyCode
    }
  }
  images(first: 1) {
    nodes {
      id
      url
      altText
      width
      height
    }
  }
}
query RecommendedProducts($country: CountryCode, $language: LanguageCode)
  @inContext(country: $country, language: $language) {
  products(first: 4, sortKey: UPDATED_AT, reverse: true) {
    nodes {
      ...RecommendedProduct
    }
  }
}
";

    pub use super::featured_collection::Image;

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub country: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub language: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Products,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Products {
        pub nodes: Vec<ProductNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub title: String,
        pub handle: String,
        pub price_range: PriceRange,
        pub images: Images,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MoneyV2 {
        pub amount: String,
        pub currency_code: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Images {
        pub nodes: Vec<Image>,
    }
}

impl GraphQLQuery for RecommendedProducts {
    type Variables = recommended_products::Variables;
    type ResponseData = recommended_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: recommended_products::QUERY,
            operation_name: recommended_products::OPERATION_NAME,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_omits_unset_context() {
        let body = FeaturedCollection::build_query(featured_collection::Variables::default());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["operationName"], "FeaturedCollection");
        assert_eq!(json["variables"], serde_json::json!({}));
        assert!(json["query"].as_str().unwrap().contains("@inContext"));
    }

    #[test]
    fn test_featured_collection_response_shape() {
        let data: featured_collection::ResponseData = serde_json::from_value(serde_json::json!({
            "collections": {"nodes": [{
                "id": "gid://shopify/Collection/1",
                "title": "Summer",
                "handle": "summer",
                "image": {"url": "https://cdn.shopify.com/s.png", "altText": null}
            }]}
        }))
        .unwrap();

        let node = data.collections.nodes.first().unwrap();
        assert_eq!(node.handle, "summer");
        assert!(node.image.as_ref().unwrap().alt_text.is_none());
    }

    #[test]
    fn test_recommended_products_uses_own_operation() {
        let body = RecommendedProducts::build_query(recommended_products::Variables {
            country: Some("CO".to_string()),
            language: None,
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["operationName"], "RecommendedProducts");
        assert_eq!(json["variables"]["country"], "CO");
    }
}
