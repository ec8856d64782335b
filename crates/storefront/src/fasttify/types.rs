//! Product records returned by the Fasttify store-products endpoint.
//!
//! Records are passed through as the API sends them. The API is loosely
//! typed, so every field reads leniently: missing or `null` values take the
//! field's default, text fields accept any scalar, and numeric fields accept
//! numbers or numeric text. Any JSON object reads as a product.

use fasttify_storefront_core::ProductId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A product as stored in Fasttify.
///
/// `attributes`, `tags` and `variants` arrive as JSON-encoded text and are
/// kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FasttifyProduct {
    #[serde(deserialize_with = "lenient_string")]
    pub id: ProductId,
    #[serde(deserialize_with = "lenient_string")]
    pub store_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    /// Prior price; `None` when the store left it blank.
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub compare_at_price: Option<f64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub cost_per_item: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub sku: String,
    #[serde(deserialize_with = "lenient_string")]
    pub barcode: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_images")]
    pub images: ProductImages,
    #[serde(deserialize_with = "lenient_string")]
    pub attributes: String,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub slug: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub featured: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub tags: String,
    #[serde(deserialize_with = "lenient_string")]
    pub variants: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub supplier: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub owner: String,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub updated_at: String,
}

impl FasttifyProduct {
    /// First image with its alt text defaulted to the product name.
    ///
    /// Undecodable image text is logged and treated as no images.
    #[must_use]
    pub fn first_image(&self) -> Option<ProductImage> {
        let images = self.images.decode().unwrap_or_else(|e| {
            tracing::warn!(product_id = %self.id, error = %e, "Undecodable product images");
            Vec::new()
        });

        images.into_iter().next().map(|image| ProductImage {
            alt: if image.alt.is_empty() {
                self.name.clone()
            } else {
                image.alt
            },
            url: image.url,
        })
    }
}

/// A single product image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub alt: String,
}

/// Product images, either already decoded or as JSON-encoded text.
///
/// Call [`ProductImages::decode`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductImages {
    Decoded(Vec<ProductImage>),
    Encoded(String),
}

impl Default for ProductImages {
    fn default() -> Self {
        Self::Decoded(Vec::new())
    }
}

impl ProductImages {
    /// Decode into a list of images.
    ///
    /// A decoded list is returned unchanged; encoded text is parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoded text is not a JSON list of images.
    pub fn decode(&self) -> Result<Vec<ProductImage>, serde_json::Error> {
        match self {
            Self::Decoded(images) => Ok(images.clone()),
            Self::Encoded(text) => serde_json::from_str(text),
        }
    }
}

/// Text form of a scalar; `None` for `null`. Composite values become their
/// JSON encoding.
fn text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// A number, or text holding one.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
        _ => None,
    }
}

fn lenient_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(T::from(text(Value::deserialize(deserializer)?).unwrap_or_default()))
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text(Value::deserialize(deserializer)?))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

/// Images as a list or JSON text. Other shapes, and lists that are not
/// image records, read as no images.
fn lenient_images<'de, D>(deserializer: D) -> Result<ProductImages, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => ProductImages::Encoded(s),
        list @ Value::Array(_) => serde_json::from_value(list)
            .map(ProductImages::Decoded)
            .unwrap_or_default(),
        _ => ProductImages::default(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_encoded_images() {
        let images = ProductImages::Encoded(r#"[{"url":"a","alt":"b"}]"#.to_string());
        assert_eq!(
            images.decode().unwrap(),
            vec![ProductImage {
                url: "a".to_string(),
                alt: "b".to_string(),
            }]
        );
    }

    #[test]
    fn test_decode_passes_decoded_images_through() {
        let list = vec![
            ProductImage {
                url: "https://cdn.example/1.png".to_string(),
                alt: "front".to_string(),
            },
            ProductImage {
                url: "https://cdn.example/2.png".to_string(),
                alt: String::new(),
            },
        ];
        let images = ProductImages::Decoded(list.clone());
        assert_eq!(images.decode().unwrap(), list);
    }

    #[test]
    fn test_decode_rejects_garbage_text() {
        assert!(ProductImages::Encoded("not json".to_string()).decode().is_err());
        assert!(ProductImages::Encoded(String::new()).decode().is_err());
    }

    #[test]
    fn test_images_accept_both_wire_shapes() {
        let decoded: ProductImages = serde_json::from_value(json!([{"url": "a", "alt": "b"}])).unwrap();
        assert!(matches!(decoded, ProductImages::Decoded(ref v) if v.len() == 1));

        let encoded: ProductImages =
            serde_json::from_value(json!(r#"[{"url":"a","alt":"b"}]"#)).unwrap();
        assert!(matches!(encoded, ProductImages::Encoded(_)));
    }

    #[test]
    fn test_product_deserializes_camel_case() {
        let product: FasttifyProduct = serde_json::from_value(json!({
            "id": "1",
            "storeId": "6c13a0d",
            "name": "Shirt",
            "description": "Cotton",
            "price": 20000,
            "compareAtPrice": 25000,
            "costPerItem": null,
            "sku": "SH-1",
            "barcode": "",
            "quantity": 3,
            "category": "apparel",
            "images": [],
            "attributes": "[]",
            "status": "active",
            "slug": null,
            "featured": null,
            "tags": "[\"summer\"]",
            "variants": "[]",
            "supplier": null,
            "owner": "owner-1",
            "createdAt": "2025-01-01T00:00:00.000Z",
            "updatedAt": "2025-01-02T00:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "1");
        assert_eq!(product.store_id, "6c13a0d");
        assert!((product.price - 20000.0).abs() < f64::EPSILON);
        assert_eq!(product.compare_at_price, Some(25000.0));
        assert_eq!(product.cost_per_item, None);
        assert_eq!(product.tags, "[\"summer\"]");
        assert_eq!(product.images, ProductImages::Decoded(vec![]));
    }

    #[test]
    fn test_product_tolerates_missing_and_null_fields() {
        let product: FasttifyProduct = serde_json::from_value(json!({
            "id": "2",
            "name": "Mug",
            "description": null,
            "images": null
        }))
        .unwrap();

        assert_eq!(product.name, "Mug");
        assert!(product.description.is_empty());
        assert_eq!(product.images, ProductImages::default());
        assert!(product.quantity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_product_reads_loosely_typed_fields() {
        let product: FasttifyProduct = serde_json::from_value(json!({
            "id": 7,
            "name": "Cap",
            "price": " 15000.5 ",
            "compareAtPrice": "",
            "costPerItem": "8000",
            "quantity": "3",
            "featured": false,
            "slug": 12,
            "supplier": {"name": "Acme"},
            "tags": ["summer"],
            "images": {"url": "a"}
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "7");
        assert!((product.price - 15000.5).abs() < f64::EPSILON);
        assert_eq!(product.compare_at_price, None);
        assert_eq!(product.cost_per_item, Some(8000.0));
        assert!((product.quantity - 3.0).abs() < f64::EPSILON);
        assert_eq!(product.featured.as_deref(), Some("false"));
        assert_eq!(product.slug.as_deref(), Some("12"));
        assert_eq!(product.supplier.as_deref(), Some(r#"{"name":"Acme"}"#));
        assert_eq!(product.tags, r#"["summer"]"#);
        assert_eq!(product.images, ProductImages::default());
    }

    #[test]
    fn test_non_record_image_list_reads_as_no_images() {
        let product: FasttifyProduct =
            serde_json::from_value(json!({"name": "Cap", "images": ["a.png"]})).unwrap();
        assert!(product.first_image().is_none());
    }

    #[test]
    fn test_first_image_alt_falls_back_to_name() {
        let product = FasttifyProduct {
            name: "Shirt".to_string(),
            images: ProductImages::Encoded(r#"[{"url":"a","alt":""},{"url":"b","alt":"back"}]"#.to_string()),
            ..FasttifyProduct::default()
        };

        let image = product.first_image().unwrap();
        assert_eq!(image.url, "a");
        assert_eq!(image.alt, "Shirt");
    }

    #[test]
    fn test_first_image_none_when_undecodable_or_empty() {
        let garbage = FasttifyProduct {
            images: ProductImages::Encoded("{".to_string()),
            ..FasttifyProduct::default()
        };
        assert!(garbage.first_image().is_none());
        assert!(FasttifyProduct::default().first_image().is_none());
    }
}
