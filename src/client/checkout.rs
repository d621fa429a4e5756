//! # Checkout
//!
//! Three-step checkout: shipping details, payment, confirmation.
//!
//! Checkout needs a signed-in user and a non-empty cart. Each step is
//! validated before moving on; failures come back as
//! [`StoreError::Validation`] with one message per offending field, keyed
//! the way the storefront form names its inputs (`firstName`, `zipCode`...).
//!
//! Payment is simulated: `submit_order` waits for the processing delay,
//! generates an `ORD-NNNNNN` number and clears the cart.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::client::cart::CartFacade;
use crate::client::error::{FieldErrors, StoreError};
use crate::client::store::CartItem;
use crate::shared::OrderSummary;

/// Simulated payment processing time
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Confirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Paypal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub card_name: String,
    /// Spaces are ignored when validating
    pub card_number: String,
    /// `MM/YY`
    pub expiry_date: String,
    pub cvv: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub shipping: ShippingDetails,
    pub payment_method: PaymentMethod,
    pub card: CardDetails,
}

/// Identity fields supplied by the sign-in provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: String,
    pub items: Vec<CartItem>,
    pub summary: OrderSummary,
    pub shipping: ShippingDetails,
    pub payment_method: PaymentMethod,
    pub placed_at: DateTime<Utc>,
}

/// Loose email check: `something@something.something` anywhere in the input
pub fn is_valid_email(email: &str) -> bool {
    email.split_whitespace().any(|token| {
        token.match_indices('@').any(|(at, _)| {
            let domain = &token[at + 1..];
            at > 0
                && domain
                    .char_indices()
                    .any(|(dot, c)| c == '.' && dot > 0 && dot + 1 < domain.len())
        })
    })
}

fn all_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_card_number(number: &str) -> bool {
    let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
    digits.len() == 16 && all_digits(&digits)
}

pub fn is_valid_expiry(expiry: &str) -> bool {
    let bytes = expiry.as_bytes();
    bytes.len() == 5
        && bytes[2] == b'/'
        && all_digits(&expiry[..2])
        && all_digits(&expiry[3..])
}

pub fn is_valid_cvv(cvv: &str) -> bool {
    (3..=4).contains(&cvv.len()) && all_digits(cvv)
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) -> bool {
    if value.is_empty() {
        errors.insert(field.to_string(), message.to_string());
        false
    } else {
        true
    }
}

impl ShippingDetails {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "firstName", &self.first_name, "First name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        if require(&mut errors, "email", &self.email, "Email is required") && !is_valid_email(&self.email) {
            errors.insert("email".into(), "Email is invalid".into());
        }
        require(&mut errors, "address", &self.address, "Address is required");
        require(&mut errors, "city", &self.city, "City is required");
        require(&mut errors, "state", &self.state, "State is required");
        require(&mut errors, "zipCode", &self.zip_code, "ZIP code is required");
        require(&mut errors, "country", &self.country, "Country is required");
        errors
    }
}

impl CardDetails {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "cardName", &self.card_name, "Name on card is required");
        if require(&mut errors, "cardNumber", &self.card_number, "Card number is required")
            && !is_valid_card_number(&self.card_number)
        {
            errors.insert("cardNumber".into(), "Card number must be 16 digits".into());
        }
        if require(&mut errors, "expiryDate", &self.expiry_date, "Expiry date is required")
            && !is_valid_expiry(&self.expiry_date)
        {
            errors.insert("expiryDate".into(), "Use format MM/YY".into());
        }
        if require(&mut errors, "cvv", &self.cvv, "CVV is required") && !is_valid_cvv(&self.cvv) {
            errors.insert("cvv".into(), "CVV must be 3 or 4 digits".into());
        }
        errors
    }
}

impl CheckoutForm {
    pub fn validate_step(&self, step: CheckoutStep) -> Result<(), StoreError> {
        let errors = match step {
            CheckoutStep::Shipping => self.shipping.validate(),
            CheckoutStep::Payment => match self.payment_method {
                PaymentMethod::CreditCard => self.card.validate(),
                PaymentMethod::Paypal => FieldErrors::new(),
            },
            CheckoutStep::Confirmation => FieldErrors::new(),
        };
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(errors))
        }
    }
}

/// `ORD-` followed by six digits, 100000 to 999999
pub fn generate_order_number() -> String {
    format!("ORD-{}", rand::thread_rng().gen_range(100_000..=999_999))
}

/// One checkout session
#[derive(Debug)]
pub struct CheckoutFlow {
    cart: CartFacade,
    step: CheckoutStep,
    form: CheckoutForm,
    processing_delay: Duration,
    confirmation: Option<OrderConfirmation>,
}

impl CheckoutFlow {
    /// Start checkout; fails if nobody is signed in or the cart is empty
    pub async fn begin(cart: CartFacade) -> Result<Self, StoreError> {
        {
            let store = cart.store().read().await;
            if store.user_id().is_none() {
                return Err(StoreError::NotSignedIn);
            }
            if store.cart().is_empty() {
                return Err(StoreError::EmptyCart);
            }
        }
        Ok(Self {
            cart,
            step: CheckoutStep::Shipping,
            form: CheckoutForm::default(),
            processing_delay: DEFAULT_PROCESSING_DELAY,
            confirmation: None,
        })
    }

    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn form(&self) -> &CheckoutForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut CheckoutForm {
        &mut self.form
    }

    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    /// Copy email and name from the identity profile
    pub fn prefill(&mut self, profile: &UserProfile) {
        let shipping = &mut self.form.shipping;
        shipping.email = profile.email.clone().unwrap_or_default();
        shipping.first_name = profile.first_name.clone().unwrap_or_default();
        shipping.last_name = profile.last_name.clone().unwrap_or_default();
    }

    pub async fn order_summary(&self) -> OrderSummary {
        self.cart.order_summary().await
    }

    /// Validate shipping details and move to payment
    pub fn next_step(&mut self) -> Result<CheckoutStep, StoreError> {
        match self.step {
            CheckoutStep::Shipping => {
                self.form.validate_step(CheckoutStep::Shipping)?;
                self.step = CheckoutStep::Payment;
                Ok(self.step)
            }
            CheckoutStep::Payment => Err(StoreError::InvalidStep(
                "payment is completed by submitting the order".into(),
            )),
            CheckoutStep::Confirmation => Err(StoreError::InvalidStep("order already placed".into())),
        }
    }

    pub fn prev_step(&mut self) -> Result<CheckoutStep, StoreError> {
        match self.step {
            CheckoutStep::Payment => {
                self.step = CheckoutStep::Shipping;
                Ok(self.step)
            }
            CheckoutStep::Shipping => Err(StoreError::InvalidStep("already at the first step".into())),
            CheckoutStep::Confirmation => Err(StoreError::InvalidStep("order already placed".into())),
        }
    }

    /// Validate payment, process the order and clear the cart
    ///
    /// A failure to clear the cart is logged; the order still stands.
    pub async fn submit_order(&mut self) -> Result<OrderConfirmation, StoreError> {
        if self.step != CheckoutStep::Payment {
            return Err(StoreError::InvalidStep(format!(
                "cannot submit an order from the {:?} step",
                self.step
            )));
        }
        self.form.validate_step(CheckoutStep::Shipping)?;
        self.form.validate_step(CheckoutStep::Payment)?;

        let items = self.cart.items().await;
        if items.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        let summary = self.cart.order_summary().await;

        tokio::time::sleep(self.processing_delay).await;

        let confirmation = OrderConfirmation {
            order_number: generate_order_number(),
            items,
            summary,
            shipping: self.form.shipping.clone(),
            payment_method: self.form.payment_method,
            placed_at: Utc::now(),
        };
        if let Err(e) = self.cart.clear_cart().await {
            tracing::warn!(
                "Order {} placed but the cart could not be cleared: {}",
                confirmation.order_number,
                e
            );
        }
        self.step = CheckoutStep::Confirmation;

        tracing::info!(
            "Order {} placed: {} line(s), total {}",
            confirmation.order_number,
            confirmation.items.len(),
            confirmation.summary.total
        );
        self.confirmation = Some(confirmation.clone());
        Ok(confirmation)
    }
}
