use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProductSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub size: String,
    #[serde(default)]
    pub stock: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sold: i64,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub sizes: Vec<ProductSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_price: f64,
    /// Percentage off the base price
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_show: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub brand_id: Option<i64>,
    /// Key grouping the product's images on the media service
    #[serde(default)]
    pub file_key: Option<String>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
}

impl Product {
    pub fn total_stock(&self) -> i64 {
        self.variants.iter().map(|v| v.stock).sum()
    }

    /// Base price after the discount percentage.
    pub fn sale_price(&self) -> f64 {
        let discount = self.discount.clamp(0.0, 100.0);
        self.base_price * (100.0 - discount) / 100.0
    }
}

/// Image stored on the media service. `data` is base64 image content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MediaItem {
    #[serde(default)]
    pub name: Option<String>,
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_with_variants() {
        let json = r#"{
            "id": 5, "name": "Runner", "description": "Light shoe",
            "basePrice": 1200000, "discount": 10, "fileKey": "abc",
            "active": true, "isNew": true, "isShow": false,
            "brandId": 2, "categoryId": 3,
            "variants": [
                {"id": 1, "color": "red", "price": 1200000, "stock": 4, "available": true,
                 "sizes": [{"id": 1, "size": "42", "stock": 4}]},
                {"color": "blue", "stock": 6}
            ],
            "createdAt": "2025-01-02T03:04:05Z"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.total_stock(), 10);
        assert_eq!(product.sale_price(), 1_080_000.0);
        assert_eq!(product.variants[0].sizes[0].size, "42");
        assert_eq!(product.file_key.as_deref(), Some("abc"));

        let out = serde_json::to_value(&product).unwrap();
        assert!(out.get("createdAt").is_none());
        assert_eq!(out["basePrice"], 1_200_000.0);
    }
}
