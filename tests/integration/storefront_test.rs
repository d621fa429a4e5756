//! Facades, persistence and notifications through a real `Storefront`

use std::time::Duration;

use assert_matches::assert_matches;
use luxemarket::client::checkout::{CheckoutStep, PaymentMethod, UserProfile};
use luxemarket::client::notify::NotificationLevel;
use luxemarket::client::StoreError;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use crate::common::{product, storefront_in};

#[tokio::test]
async fn test_cart_and_wishlist_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (storefront, _) = storefront_in(dir.path(), None).await;
        storefront.cart().add_to_cart(&product(1, "Backpack", dec!(109.95)), 1).await.unwrap();
        storefront.cart().add_to_cart(&product(2, "T-Shirt", dec!(22.30)), 3).await.unwrap();
        storefront.wishlist().add_to_wishlist(&product(5, "Bracelet", dec!(695))).await.unwrap();
    }

    let (storefront, _) = storefront_in(dir.path(), None).await;
    let ids: Vec<u64> = storefront.cart().items().await.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(storefront.cart().cart_count().await, 4);
    assert!(storefront.wishlist().is_in_wishlist(5).await);
}

#[tokio::test]
async fn test_duplicate_wishlist_add_keeps_date() {
    let dir = tempfile::tempdir().unwrap();
    let (storefront, _) = storefront_in(dir.path(), None).await;
    let ring = product(5, "Ring", dec!(168));

    storefront.wishlist().add_to_wishlist(&ring).await.unwrap();
    let added = storefront.wishlist().items().await[0].date_added;
    tokio::time::sleep(Duration::from_millis(5)).await;
    storefront.wishlist().add_to_wishlist(&ring).await.unwrap();

    let items = storefront.wishlist().items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].date_added, added);
}

#[tokio::test]
async fn test_move_to_cart_is_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let (storefront, _) = storefront_in(dir.path(), None).await;
    storefront.wishlist().add_to_wishlist(&product(5, "Ring", dec!(168))).await.unwrap();

    assert!(storefront.wishlist().move_to_cart(5).await.unwrap());
    assert_eq!(storefront.wishlist().wishlist_count().await, 0);
    let cart = storefront.cart().items().await;
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, 1);
    assert_eq!(cart[0].price, dec!(168));
}

#[tokio::test]
async fn test_online_mutations_toast_offline_ones_do_not() {
    let dir = tempfile::tempdir().unwrap();
    let (storefront, notifier) = storefront_in(dir.path(), None).await;
    let mut toasts = notifier.subscribe();

    storefront.cart().remove_from_cart(42).await.unwrap();
    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, NotificationLevel::Success);
    assert_eq!(toast.description, "Item removed from cart.");

    storefront.store().write().await.set_online(false);
    storefront.cart().remove_from_cart(42).await.unwrap();
    assert!(toasts.try_recv().is_err());
}

#[tokio::test]
async fn test_checkout_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (storefront, _) = storefront_in(dir.path(), None).await;

    assert_matches!(storefront.checkout().await, Err(StoreError::NotSignedIn));
    storefront.set_user(Some("user-1".into())).await;
    assert_matches!(storefront.checkout().await, Err(StoreError::EmptyCart));

    storefront.cart().add_to_cart(&product(2, "T-Shirt", dec!(22.30)), 2).await.unwrap();
    let mut checkout = storefront
        .checkout()
        .await
        .unwrap()
        .with_processing_delay(Duration::ZERO);

    checkout.prefill(&UserProfile {
        email: Some("ada@example.com".into()),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
    });
    assert_matches!(checkout.next_step(), Err(StoreError::Validation(errors)) if errors.contains_key("address"));

    let shipping = &mut checkout.form_mut().shipping;
    shipping.address = "12 Analytical Way".into();
    shipping.city = "London".into();
    shipping.state = "LDN".into();
    shipping.zip_code = "N1 9GU".into();
    shipping.country = "UK".into();
    assert_eq!(checkout.next_step().unwrap(), CheckoutStep::Payment);

    checkout.form_mut().payment_method = PaymentMethod::Paypal;
    let confirmation = checkout.submit_order().await.unwrap();

    assert!(confirmation.order_number.starts_with("ORD-"));
    assert_eq!(confirmation.summary.subtotal, dec!(44.60));
    assert_eq!(confirmation.summary.total, dec!(57.72));
    assert_eq!(checkout.step(), CheckoutStep::Confirmation);
    assert!(storefront.cart().items().await.is_empty());
}
