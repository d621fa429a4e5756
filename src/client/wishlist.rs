//! # Wishlist
//!
//! Wishlist operations with optimistic updates, plus share links.

use reqwest::Url;
use serde::Serialize;

use crate::client::error::StoreError;
use crate::client::notify::Notification;
use crate::client::offline::OptimisticCoordinator;
use crate::client::store::WishlistItem;
use crate::shared::{Product, SharedError};

#[derive(Serialize)]
struct SharedEntry<'a> {
    id: u64,
    title: &'a str,
}

#[derive(Debug, Clone)]
pub struct WishlistFacade {
    coordinator: OptimisticCoordinator,
}

impl WishlistFacade {
    pub fn new(coordinator: OptimisticCoordinator) -> Self {
        Self { coordinator }
    }

    async fn wishlist_snapshot(&self) -> Vec<WishlistItem> {
        self.coordinator.store().read().await.wishlist().to_vec()
    }

    pub async fn add_to_wishlist(&self, product: &Product) -> Result<(), StoreError> {
        let success = format!("{} has been added to your wishlist.", product.title);
        let previous = self.wishlist_snapshot().await;
        let product = product.clone();

        self.coordinator
            .perform_optimistic_update(
                "add-to-wishlist",
                move |store| {
                    store.add_to_wishlist(&product);
                    Ok(())
                },
                move |store| store.set_wishlist(previous),
                Some(success.as_str()),
                Some("Failed to add item to wishlist. Please try again."),
            )
            .await
    }

    pub async fn remove_from_wishlist(&self, product_id: u64) -> Result<(), StoreError> {
        let previous = self.wishlist_snapshot().await;
        self.coordinator
            .perform_optimistic_update(
                "remove-from-wishlist",
                move |store| {
                    store.remove_from_wishlist(product_id);
                    Ok(())
                },
                move |store| store.set_wishlist(previous),
                Some("Item removed from wishlist."),
                Some("Failed to remove item from wishlist. Please try again."),
            )
            .await
    }

    pub async fn clear_wishlist(&self) -> Result<(), StoreError> {
        let previous = self.wishlist_snapshot().await;
        self.coordinator
            .perform_optimistic_update(
                "clear-wishlist",
                |store| {
                    store.clear_wishlist();
                    Ok(())
                },
                move |store| store.set_wishlist(previous),
                Some("Wishlist cleared successfully."),
                Some("Failed to clear wishlist. Please try again."),
            )
            .await
    }

    pub async fn is_in_wishlist(&self, product_id: u64) -> bool {
        self.coordinator.store().read().await.is_in_wishlist(product_id)
    }

    /// Remove if saved, add otherwise; returns the new membership
    pub async fn toggle_wishlist(&self, product: &Product) -> Result<bool, StoreError> {
        if self.is_in_wishlist(product.id).await {
            self.remove_from_wishlist(product.id).await?;
            Ok(false)
        } else {
            self.add_to_wishlist(product).await?;
            Ok(true)
        }
    }

    /// Move a saved item into the cart; `Ok(false)` if it was not saved
    ///
    /// A rollback restores both the cart and the wishlist.
    pub async fn move_to_cart(&self, product_id: u64) -> Result<bool, StoreError> {
        let (previous_cart, previous_wishlist) = {
            let store = self.coordinator.store().read().await;
            if !store.is_in_wishlist(product_id) {
                return Ok(false);
            }
            (store.cart().to_vec(), store.wishlist().to_vec())
        };

        self.coordinator
            .perform_optimistic_update(
                "move-to-cart",
                move |store| Ok(store.move_to_cart(product_id)),
                move |store| {
                    store.set_cart(previous_cart);
                    store.set_wishlist(previous_wishlist);
                },
                Some("Item moved to cart."),
                Some("Failed to move item to cart. Please try again."),
            )
            .await
    }

    pub async fn items(&self) -> Vec<WishlistItem> {
        self.wishlist_snapshot().await
    }

    pub async fn wishlist_count(&self) -> usize {
        self.coordinator.store().read().await.wishlist().len()
    }

    /// `{origin}/shared-wishlist?data=<url-encoded JSON [{id, title}]>`
    pub async fn share_link(&self, origin: &str) -> Result<String, StoreError> {
        match self.build_share_link(origin).await {
            Ok(link) => {
                tracing::debug!("Created wishlist share link ({} bytes)", link.len());
                self.coordinator.notifier().notify(Notification::success(
                    "Wishlist link copied!",
                    "Share this link with friends to show them your wishlist.",
                ));
                Ok(link)
            }
            Err(e) => {
                tracing::error!("Failed to share wishlist: {}", e);
                self.coordinator.notifier().notify(Notification::error(
                    "Failed to share wishlist",
                    "An error occurred while creating a shareable link.",
                ));
                Err(e)
            }
        }
    }

    async fn build_share_link(&self, origin: &str) -> Result<String, StoreError> {
        let data = {
            let store = self.coordinator.store().read().await;
            let entries: Vec<SharedEntry<'_>> = store
                .wishlist()
                .iter()
                .map(|item| SharedEntry { id: item.id, title: &item.title })
                .collect();
            serde_json::to_string(&entries)?
        };

        let base = format!("{}/shared-wishlist", origin.trim_end_matches('/'));
        let url = Url::parse_with_params(&base, &[("data", data)])
            .map_err(|e| SharedError::validation("origin", format!("{}: {}", origin, e)))?;
        Ok(url.to_string())
    }
}
