//! # Client Store
//!
//! Single source of truth for the cart, the wishlist, connectivity and the
//! pending-operation queue.
//!
//! The store is an explicit context object: callers share it as a
//! [`SharedStore`] (`Arc<RwLock<Store>>`) and every mutation runs under one
//! write guard, so mutations are strictly ordered within a process.
//!
//! ## Offline semantics
//!
//! Every mutation call made while `is_online()` is false appends exactly one
//! [`PendingOperation`]. `move_to_cart` is two logical mutations (add to cart,
//! remove from wishlist) and appends two.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luxemarket::client::store::Store;
//! use luxemarket::shared::ProductSummary;
//! use rust_decimal::Decimal;
//!
//! let mut store = Store::new();
//! let shirt = ProductSummary { id: 2, title: "Shirt".into(), price: Decimal::new(2230, 2), image: String::new() };
//! store.add_to_cart(shirt, 2);
//! assert!(store.is_in_cart(2));
//! ```

pub mod models;
pub mod persistence;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::client::offline::queue::{Operation, OperationProduct, PendingOperation, PendingQueue};
use crate::shared::{Product, ProductSummary};

pub use models::{CartItem, WishlistItem};
pub use persistence::{FileStorage, MemoryStorage, PersistedState, StatePersistence, StorageBackend};

/// Store handle shared between facades, the coordinator and the monitor
pub type SharedStore = Arc<RwLock<Store>>;

/// Cart, wishlist, connectivity and pending operations
#[derive(Debug, Clone)]
pub struct Store {
    cart: Vec<CartItem>,
    wishlist: Vec<WishlistItem>,
    pending: PendingQueue,
    is_online: bool,
    user_id: Option<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Empty store, assumed online until told otherwise
    pub fn new() -> Self {
        Self {
            cart: Vec::new(),
            wishlist: Vec::new(),
            pending: PendingQueue::new(),
            is_online: true,
            user_id: None,
        }
    }

    /// Store seeded from persisted state
    pub fn from_persisted(state: PersistedState) -> Self {
        let mut store = Self::new();
        store.restore(state);
        store
    }

    /// Wrap into a [`SharedStore`]
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    fn record_if_offline(&mut self, operation: Operation) {
        if self.is_online {
            return;
        }
        let id = self.pending.push(PendingOperation::new(operation));
        tracing::debug!("Offline: queued pending operation {}", id);
    }

    // Cart

    /// Add `quantity` of `product`, merging into an existing line
    ///
    /// A zero quantity changes nothing and queues nothing.
    pub fn add_to_cart(&mut self, product: impl Into<ProductSummary>, quantity: u32) {
        let product = product.into();
        if quantity == 0 {
            tracing::debug!("Ignoring add of zero units of product {}", product.id);
            return;
        }
        let payload = OperationProduct::from(&product);

        match self.cart.iter_mut().find(|item| item.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.cart.push(CartItem::new(product, quantity)),
        }

        self.record_if_offline(Operation::AddToCart { product: payload, quantity });
    }

    /// Remove a line; absent ids are a no-op
    pub fn remove_from_cart(&mut self, product_id: u64) {
        self.cart.retain(|item| item.id != product_id);
        self.record_if_offline(Operation::RemoveFromCart { product_id });
    }

    /// Overwrite a line's quantity; `quantity <= 0` removes the line
    pub fn update_quantity(&mut self, product_id: u64, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return;
        }
        let quantity_u32 = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.cart.iter_mut().find(|item| item.id == product_id) {
            item.quantity = quantity_u32;
        }
        self.record_if_offline(Operation::UpdateQuantity { product_id, quantity });
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.record_if_offline(Operation::ClearCart);
    }

    pub fn is_in_cart(&self, product_id: u64) -> bool {
        self.cart.iter().any(|item| item.id == product_id)
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Replace the cart wholesale (rollback path)
    pub fn set_cart(&mut self, cart: Vec<CartItem>) {
        self.cart = cart;
    }

    // Wishlist

    /// Save a product; an id already in the wishlist is left untouched
    pub fn add_to_wishlist(&mut self, product: &Product) {
        if !self.is_in_wishlist(product.id) {
            self.wishlist.push(WishlistItem::from_product(product, Utc::now()));
        }
        self.record_if_offline(Operation::AddToWishlist {
            product: OperationProduct::from(product),
        });
    }

    pub fn remove_from_wishlist(&mut self, product_id: u64) {
        self.wishlist.retain(|item| item.id != product_id);
        self.record_if_offline(Operation::RemoveFromWishlist { product_id });
    }

    pub fn clear_wishlist(&mut self) {
        self.wishlist.clear();
        self.record_if_offline(Operation::ClearWishlist);
    }

    pub fn is_in_wishlist(&self, product_id: u64) -> bool {
        self.wishlist.iter().any(|item| item.id == product_id)
    }

    /// Add if absent, remove if present; returns the new membership
    pub fn toggle_wishlist(&mut self, product: &Product) -> bool {
        if self.is_in_wishlist(product.id) {
            self.remove_from_wishlist(product.id);
            false
        } else {
            self.add_to_wishlist(product);
            true
        }
    }

    /// Move a wishlist item into the cart (quantity 1)
    ///
    /// Both halves happen under the caller's single `&mut` borrow, so no
    /// observer sees the item in both collections or in neither. Returns
    /// `false` if the id is not in the wishlist.
    pub fn move_to_cart(&mut self, product_id: u64) -> bool {
        let Some(item) = self.wishlist.iter().find(|item| item.id == product_id).cloned() else {
            return false;
        };
        self.add_to_cart(&item, 1);
        self.remove_from_wishlist(product_id);
        true
    }

    pub fn wishlist(&self) -> &[WishlistItem] {
        &self.wishlist
    }

    /// Replace the wishlist wholesale (rollback path)
    pub fn set_wishlist(&mut self, wishlist: Vec<WishlistItem>) {
        self.wishlist = wishlist;
    }

    // Session

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    /// Set the connectivity flag; replay is the network monitor's job
    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
    }

    // Pending operations

    pub fn pending_operations(&self) -> &PendingQueue {
        &self.pending
    }

    pub(crate) fn pending_operations_mut(&mut self) -> &mut PendingQueue {
        &mut self.pending
    }

    pub fn add_pending_operation(&mut self, operation: PendingOperation) -> String {
        self.pending.push(operation)
    }

    pub fn remove_pending_operation(&mut self, id: &str) -> Option<PendingOperation> {
        self.pending.remove(id)
    }

    /// Drain the queue in insertion order, logging each entry
    ///
    /// Nothing is resubmitted anywhere; use
    /// [`ReplayEngine`](crate::client::offline::replay::ReplayEngine) to
    /// actually deliver queued operations.
    pub fn process_pending_operations(&mut self) -> Vec<PendingOperation> {
        let drained = self.pending.drain();
        for op in &drained {
            tracing::info!("Processing operation: {:?} ({})", op.kind(), op.id);
        }
        drained
    }

    // Persistence

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
            pending_operations: self.pending.clone(),
        }
    }

    /// Replace the persisted collections; flag and user id are untouched
    pub fn restore(&mut self, state: PersistedState) {
        self.cart = state.cart;
        self.wishlist = state.wishlist;
        self.pending = state.pending_operations;
    }
}
