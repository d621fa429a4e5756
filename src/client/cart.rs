//! # Cart
//!
//! Cart operations with optimistic updates and user-facing messages.
//!
//! Every mutation snapshots the cart first; if the update fails the snapshot
//! is restored and an error toast is shown.

use rust_decimal::Decimal;

use crate::client::error::StoreError;
use crate::client::offline::OptimisticCoordinator;
use crate::client::store::{CartItem, SharedStore};
use crate::shared::{OrderSummary, PricingRules, ProductSummary};

#[derive(Debug, Clone)]
pub struct CartFacade {
    coordinator: OptimisticCoordinator,
    pricing: PricingRules,
}

impl CartFacade {
    pub fn new(coordinator: OptimisticCoordinator) -> Self {
        Self {
            coordinator,
            pricing: PricingRules::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingRules) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn store(&self) -> &SharedStore {
        self.coordinator.store()
    }

    pub fn pricing(&self) -> &PricingRules {
        &self.pricing
    }

    async fn cart_snapshot(&self) -> Vec<CartItem> {
        self.coordinator.store().read().await.cart().to_vec()
    }

    /// Add `quantity` units; a zero quantity is rejected and rolled back
    pub async fn add_to_cart(&self, product: impl Into<ProductSummary>, quantity: u32) -> Result<(), StoreError> {
        let product = product.into();
        let success = format!("{} has been added to your cart.", product.title);
        let previous = self.cart_snapshot().await;

        self.coordinator
            .perform_optimistic_update(
                "add-to-cart",
                move |store| {
                    if quantity == 0 {
                        return Err(StoreError::InvalidQuantity {
                            product_id: product.id,
                            quantity,
                        });
                    }
                    store.add_to_cart(product, quantity);
                    Ok(())
                },
                move |store| store.set_cart(previous),
                Some(success.as_str()),
                Some("Failed to add item to cart. Please try again."),
            )
            .await
    }

    pub async fn remove_from_cart(&self, product_id: u64) -> Result<(), StoreError> {
        let previous = self.cart_snapshot().await;
        self.coordinator
            .perform_optimistic_update(
                "remove-from-cart",
                move |store| {
                    store.remove_from_cart(product_id);
                    Ok(())
                },
                move |store| store.set_cart(previous),
                Some("Item removed from cart."),
                Some("Failed to remove item from cart. Please try again."),
            )
            .await
    }

    /// Overwrite a line's quantity; zero or less removes the line
    pub async fn update_quantity(&self, product_id: u64, quantity: i64) -> Result<(), StoreError> {
        let previous = self.cart_snapshot().await;
        self.coordinator
            .perform_optimistic_update(
                "update-quantity",
                move |store| {
                    store.update_quantity(product_id, quantity);
                    Ok(())
                },
                move |store| store.set_cart(previous),
                None,
                None,
            )
            .await
    }

    pub async fn clear_cart(&self) -> Result<(), StoreError> {
        let previous = self.cart_snapshot().await;
        self.coordinator
            .perform_optimistic_update(
                "clear-cart",
                |store| {
                    store.clear_cart();
                    Ok(())
                },
                move |store| store.set_cart(previous),
                Some("Cart cleared successfully."),
                Some("Failed to clear cart. Please try again."),
            )
            .await
    }

    pub async fn is_in_cart(&self, product_id: u64) -> bool {
        self.coordinator.store().read().await.is_in_cart(product_id)
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.cart_snapshot().await
    }

    /// Total units across all lines
    pub async fn cart_count(&self) -> u64 {
        self.coordinator
            .store()
            .read()
            .await
            .cart()
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Sum of price times quantity
    pub async fn cart_total(&self) -> Decimal {
        self.coordinator
            .store()
            .read()
            .await
            .cart()
            .iter()
            .map(CartItem::line_total)
            .sum()
    }

    /// Subtotal, shipping, tax and total for the current cart
    pub async fn order_summary(&self) -> OrderSummary {
        let store = self.coordinator.store().read().await;
        OrderSummary::for_items(
            store.cart().iter().map(|item| (item.price, item.quantity)),
            &self.pricing,
        )
    }
}
