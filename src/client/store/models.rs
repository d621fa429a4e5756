//! Cart and wishlist records
//!
//! Field names serialize in camelCase so persisted blobs keep the storefront's
//! `{id, title, price, image, quantity}` / `dateAdded` shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::{Product, ProductSummary};

/// One line in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product id, unique within the cart
    pub id: u64,
    pub title: String,
    pub price: Decimal,
    pub image: String,
    /// Always positive; a line driven to zero is removed instead
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product: ProductSummary, quantity: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            quantity,
        }
    }

    /// Price times quantity
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// One saved product in the wishlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    /// Product id, unique within the wishlist
    pub id: u64,
    pub title: String,
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Set once on insertion and never touched again
    pub date_added: DateTime<Utc>,
}

impl WishlistItem {
    pub fn from_product(product: &Product, date_added: DateTime<Utc>) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            date_added,
        }
    }
}

impl From<&WishlistItem> for ProductSummary {
    fn from(item: &WishlistItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            price: item.price,
            image: item.image.clone(),
        }
    }
}
