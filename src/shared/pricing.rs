//! Order pricing
//!
//! Subtotal, shipping, tax and total for a set of cart lines. The same rules
//! drive the cart page, the cart drawer and checkout.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Shipping and tax rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Subtotal at or above which shipping is free
    pub free_shipping_threshold: Decimal,
    /// Shipping charged below the threshold
    pub flat_shipping: Decimal,
    /// Tax rate applied to the subtotal (0.07 = 7%)
    pub tax_rate: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(50, 0),
            flat_shipping: Decimal::new(10, 0),
            tax_rate: Decimal::new(7, 2),
        }
    }
}

/// Priced order totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// Amount still needed for free shipping, zero once reached
    pub amount_to_free_shipping: Decimal,
    /// Progress towards free shipping, 0-100
    pub free_shipping_progress: Decimal,
}

fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl OrderSummary {
    /// Price an order from `(unit price, quantity)` pairs
    pub fn for_items<I>(items: I, rules: &PricingRules) -> Self
    where
        I: IntoIterator<Item = (Decimal, u32)>,
    {
        let subtotal: Decimal = items
            .into_iter()
            .map(|(price, quantity)| price * Decimal::from(quantity))
            .sum();
        Self::for_subtotal(subtotal, rules)
    }

    /// Price an order from its subtotal
    pub fn for_subtotal(subtotal: Decimal, rules: &PricingRules) -> Self {
        let subtotal = to_cents(subtotal);
        let shipping = if subtotal >= rules.free_shipping_threshold {
            Decimal::ZERO
        } else {
            rules.flat_shipping
        };
        let tax = to_cents(subtotal * rules.tax_rate);
        let total = subtotal + shipping + tax;

        let amount_to_free_shipping = (rules.free_shipping_threshold - subtotal).max(Decimal::ZERO);
        let free_shipping_progress = if rules.free_shipping_threshold.is_zero() {
            Decimal::ONE_HUNDRED
        } else {
            (subtotal / rules.free_shipping_threshold * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED)
        };

        Self {
            subtotal,
            shipping,
            tax,
            total,
            amount_to_free_shipping,
            free_shipping_progress,
        }
    }

    /// Whether shipping is free for this order
    pub fn ships_free(&self) -> bool {
        self.shipping.is_zero()
    }
}
