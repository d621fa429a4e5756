//! Offline queueing and replay on reconnect

use std::sync::Arc;

use luxemarket::client::offline::{OperationKind, ReplayEngine, RetryPolicy};
use luxemarket::client::sync::ConnectivityEvent;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use crate::common::{product, storefront_in, RecordingDispatcher};

#[tokio::test]
async fn test_offline_add_is_dispatched_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = RecordingDispatcher::new();
    let (storefront, _) = storefront_in(dir.path(), Some(Arc::new(dispatcher.clone()))).await;
    storefront.monitor().initialize(true).await;

    storefront.monitor().handle_event(ConnectivityEvent::Offline).await;
    storefront.cart().add_to_cart(&product(1, "Backpack", dec!(109.95)), 2).await.unwrap();

    {
        let store = storefront.store().read().await;
        assert_eq!(store.pending_operations().len(), 1);
        let op = store.pending_operations().iter().next().unwrap();
        assert_eq!(op.kind(), OperationKind::AddToCart);
        assert!(op.id.starts_with("add-to-cart-1-"));
    }

    let report = storefront.monitor().handle_event(ConnectivityEvent::Online).await.unwrap();
    assert_eq!(report.dispatched.len(), 1);
    assert!(report.is_clean());
    assert!(storefront.store().read().await.pending_operations().is_empty());

    storefront.replay().process_pending_operations().await;
    assert_eq!(dispatcher.delivered().len(), 1);
}

#[tokio::test]
async fn test_pending_operations_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (storefront, _) = storefront_in(dir.path(), None).await;
        storefront.monitor().handle_event(ConnectivityEvent::Offline).await;
        storefront.wishlist().add_to_wishlist(&product(5, "Bracelet", dec!(695))).await.unwrap();
        storefront.cart().clear_cart().await.unwrap();
    }

    let dispatcher = RecordingDispatcher::new();
    let (storefront, _) = storefront_in(dir.path(), Some(Arc::new(dispatcher.clone()))).await;
    let report = storefront.monitor().initialize(true).await.unwrap();

    assert_eq!(report.dispatched.len(), 2);
    let kinds: Vec<OperationKind> = dispatcher.delivered().iter().map(|op| op.kind()).collect();
    assert_eq!(kinds, vec![OperationKind::AddToWishlist, OperationKind::ClearCart]);
}

#[tokio::test]
async fn test_failed_target_holds_back_later_operations() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = RecordingDispatcher::new();
    let (storefront, _) = storefront_in(dir.path(), None).await;
    let replay = ReplayEngine::new(storefront.store().clone())
        .with_dispatcher(Arc::new(dispatcher.clone()))
        .with_policy(RetryPolicy::immediate(5));

    storefront.store().write().await.set_online(false);
    storefront.cart().add_to_cart(&product(1, "Backpack", dec!(109.95)), 1).await.unwrap();
    storefront.cart().add_to_cart(&product(2, "T-Shirt", dec!(22.30)), 1).await.unwrap();
    storefront.cart().update_quantity(1, 3).await.unwrap();
    storefront.store().write().await.set_online(true);

    dispatcher.fail_for(1);
    let report = replay.process_pending_operations().await;
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.deferred.len(), 1);
    assert_eq!(report.dispatched.len(), 1);
    assert_eq!(storefront.store().read().await.pending_operations().len(), 2);

    dispatcher.recover();
    let report = replay.process_pending_operations().await;
    assert_eq!(report.dispatched.len(), 2);

    let kinds: Vec<OperationKind> = dispatcher.delivered().iter().map(|op| op.kind()).collect();
    assert_eq!(
        kinds,
        vec![OperationKind::AddToCart, OperationKind::AddToCart, OperationKind::UpdateQuantity]
    );
    assert_eq!(dispatcher.delivered()[1].operation.target_id(), Some(1));
}

#[tokio::test]
async fn test_operations_abandoned_after_retry_limit() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = RecordingDispatcher::new();
    dispatcher.fail_for(7);
    let (storefront, _) = storefront_in(dir.path(), None).await;
    let replay = ReplayEngine::new(storefront.store().clone())
        .with_dispatcher(Arc::new(dispatcher.clone()))
        .with_policy(RetryPolicy::immediate(2));

    storefront.store().write().await.set_online(false);
    storefront.cart().remove_from_cart(7).await.unwrap();
    storefront.store().write().await.set_online(true);

    let first = replay.process_pending_operations().await;
    assert_eq!(first.failed.len(), 1);
    let second = replay.process_pending_operations().await;
    assert_eq!(second.abandoned.len(), 1);
    assert_eq!(second.abandoned[0].attempts, 2);
    assert!(storefront.store().read().await.pending_operations().is_empty());
}

#[tokio::test]
async fn test_legacy_drain_resubmits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = RecordingDispatcher::new();
    let (storefront, _) = storefront_in(dir.path(), Some(Arc::new(dispatcher.clone()))).await;

    storefront.store().write().await.set_online(false);
    storefront.cart().remove_from_cart(3).await.unwrap();

    let drained = storefront.store().write().await.process_pending_operations();
    assert_eq!(drained.len(), 1);
    assert!(dispatcher.delivered().is_empty());
}

#[tokio::test]
async fn test_replay_skipped_while_offline() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = RecordingDispatcher::new();
    let (storefront, _) = storefront_in(dir.path(), Some(Arc::new(dispatcher.clone()))).await;

    storefront.monitor().handle_event(ConnectivityEvent::Offline).await;
    storefront.cart().remove_from_cart(3).await.unwrap();

    let report = storefront.replay().process_pending_operations().await;
    assert!(report.dispatched.is_empty());
    assert!(dispatcher.delivered().is_empty());
    assert_eq!(storefront.store().read().await.pending_operations().len(), 1);
}
