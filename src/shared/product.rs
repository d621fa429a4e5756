/**
 * Catalog Product
 *
 * This module defines the product record returned by the remote catalog API
 * and the trimmed-down summary the cart keeps for each line.
 *
 * The JSON shape follows the catalog API directly:
 * ```json
 * { "id": 1, "title": "...", "price": 109.95, "description": "...",
 *   "category": "men's clothing", "image": "https://...",
 *   "rating": { "rate": 3.9, "count": 120 } }
 * ```
 */
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer rating attached to a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rating {
    /// Average rating (0.0 - 5.0)
    pub rate: f64,
    /// Number of ratings
    pub count: u32,
}

/// A product as served by the catalog API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Product id, unique across the catalog
    pub id: u64,
    /// Display title
    pub title: String,
    /// Unit price
    pub price: Decimal,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Category name
    #[serde(default)]
    pub category: String,
    /// Image URL
    #[serde(default)]
    pub image: String,
    /// Customer rating, absent for some records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

/// The fields a cart line needs from a product
///
/// Anything that can be put in the cart (a catalog product, a wishlist
/// entry) converts into this.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: u64,
    pub title: String,
    pub price: Decimal,
    pub image: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
        }
    }
}
