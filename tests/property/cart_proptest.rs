//! Property-based tests for cart and pricing invariants

use luxemarket::client::store::Store;
use luxemarket::shared::{OrderSummary, PricingRules, ProductSummary};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum CartAction {
    Add { id: u64, quantity: u32 },
    Remove { id: u64 },
    Update { id: u64, quantity: i64 },
}

fn action() -> impl Strategy<Value = CartAction> {
    prop_oneof![
        (1..6u64, 0..5u32).prop_map(|(id, quantity)| CartAction::Add { id, quantity }),
        (1..6u64).prop_map(|id| CartAction::Remove { id }),
        (1..6u64, -2..5i64).prop_map(|(id, quantity)| CartAction::Update { id, quantity }),
    ]
}

fn summary(id: u64) -> ProductSummary {
    ProductSummary {
        id,
        title: format!("Product {}", id),
        price: Decimal::new(id as i64 * 1_250, 2),
        image: String::new(),
    }
}

proptest! {
    #[test]
    fn test_cart_lines_unique_and_positive(actions in prop::collection::vec(action(), 0..40)) {
        let mut store = Store::new();
        for action in actions {
            match action {
                CartAction::Add { id, quantity } => store.add_to_cart(summary(id), quantity),
                CartAction::Remove { id } => store.remove_from_cart(id),
                CartAction::Update { id, quantity } => store.update_quantity(id, quantity),
            }
        }

        let mut ids: Vec<u64> = store.cart().iter().map(|item| item.id).collect();
        let len = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), len);
        prop_assert!(store.cart().iter().all(|item| item.quantity >= 1));
        prop_assert!(store.pending_operations().is_empty());
    }

    #[test]
    fn test_repeated_adds_accumulate(quantities in prop::collection::vec(1..10u32, 1..10)) {
        let mut store = Store::new();
        for quantity in &quantities {
            store.add_to_cart(summary(1), *quantity);
        }
        prop_assert_eq!(store.cart().len(), 1);
        prop_assert_eq!(store.cart()[0].quantity, quantities.iter().sum::<u32>());
    }

    #[test]
    fn test_offline_mutations_queue_one_operation_each(count in 1..20usize) {
        let mut store = Store::new();
        store.set_online(false);
        for i in 0..count {
            store.remove_from_cart(i as u64);
        }
        prop_assert_eq!(store.pending_operations().len(), count);
    }

    #[test]
    fn test_total_is_sum_of_parts(cents in 0..20_000i64) {
        let subtotal = Decimal::new(cents, 2);
        let rules = PricingRules::default();
        let summary = OrderSummary::for_subtotal(subtotal, &rules);

        prop_assert_eq!(summary.total, summary.subtotal + summary.shipping + summary.tax);
        prop_assert_eq!(summary.shipping.is_zero(), subtotal >= rules.free_shipping_threshold);
        prop_assert!(summary.free_shipping_progress <= Decimal::ONE_HUNDRED);
    }
}
