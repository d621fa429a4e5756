//! # Storefront Client Core
//!
//! Offline-first cart and wishlist state for the storefront.
//!
//! ## Architecture
//!
//! - **Store**: cart, wishlist, connectivity flag and pending operations
//! - **Offline**: optimistic updates, the operation queue and replay
//! - **Sync**: connectivity monitoring and replay on reconnect
//! - **Facades**: cart, wishlist and checkout flows with user messages
//! - **Catalog**: cached, read-only product API access
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luxemarket::client::{config::Config, Storefront};
//!
//! # async fn example() -> Result<(), luxemarket::client::error::StoreError> {
//! let storefront = Storefront::open(&Config::new()).await?;
//! storefront.monitor().initialize(true).await;
//! storefront.cart().remove_from_cart(3).await?;
//! # Ok(())
//! # }
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notify;
pub mod offline;
pub mod store;
pub mod sync;
pub mod wishlist;

use std::sync::Arc;

pub use cart::CartFacade;
pub use catalog::CatalogClient;
pub use checkout::CheckoutFlow;
pub use error::StoreError;
pub use notify::{Notification, Notifier};
pub use store::{SharedStore, Store};
pub use wishlist::WishlistFacade;

use crate::client::config::Config;
use crate::client::notify::TracingNotifier;
use crate::client::offline::{OperationDispatcher, OptimisticCoordinator, ReplayEngine};
use crate::client::store::StatePersistence;
use crate::client::sync::NetworkMonitor;

/// Everything a storefront front end needs, wired to one store
pub struct Storefront {
    store: SharedStore,
    persistence: StatePersistence,
    cart: CartFacade,
    wishlist: WishlistFacade,
    replay: ReplayEngine,
    monitor: NetworkMonitor,
    catalog: CatalogClient,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("persistence", &self.persistence)
            .field("catalog", &self.catalog.base_url())
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Load persisted state and wire the components with default sinks
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        Self::open_with(config, Arc::new(TracingNotifier), None).await
    }

    /// Like [`Storefront::open`] with a custom notifier and dispatcher
    pub async fn open_with(
        config: &Config,
        notifier: Arc<dyn Notifier>,
        dispatcher: Option<Arc<dyn OperationDispatcher>>,
    ) -> Result<Self, StoreError> {
        let persistence = config.persistence();
        let store = match persistence.load().await? {
            Some(state) => {
                tracing::info!(
                    "Restored store: {} cart line(s), {} wishlist item(s), {} pending operation(s)",
                    state.cart.len(),
                    state.wishlist.len(),
                    state.pending_operations.len()
                );
                Store::from_persisted(state)
            }
            None => Store::new(),
        }
        .into_shared();

        let coordinator = OptimisticCoordinator::new(store.clone())
            .with_persistence(persistence.clone())
            .with_notifier(notifier.clone());

        let mut replay = ReplayEngine::new(store.clone()).with_persistence(persistence.clone());
        if let Some(dispatcher) = dispatcher {
            replay = replay.with_dispatcher(dispatcher);
        }

        Ok(Self {
            cart: CartFacade::new(coordinator.clone()).with_pricing(config.app().pricing),
            wishlist: WishlistFacade::new(coordinator),
            monitor: NetworkMonitor::new(store.clone(), replay.clone()).with_notifier(notifier),
            catalog: CatalogClient::new(config),
            replay,
            persistence,
            store,
        })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn persistence(&self) -> &StatePersistence {
        &self.persistence
    }

    pub fn cart(&self) -> &CartFacade {
        &self.cart
    }

    pub fn wishlist(&self) -> &WishlistFacade {
        &self.wishlist
    }

    pub fn replay(&self) -> &ReplayEngine {
        &self.replay
    }

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Start a checkout session against this storefront's cart
    pub async fn checkout(&self) -> Result<CheckoutFlow, StoreError> {
        CheckoutFlow::begin(self.cart.clone()).await
    }

    /// Record who is signed in; `None` on sign-out
    pub async fn set_user(&self, user_id: Option<String>) {
        self.store.write().await.set_user_id(user_id);
    }
}
