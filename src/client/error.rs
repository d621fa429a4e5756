//! Client-side error types
//!
//! Every fallible store, facade and checkout path returns `StoreError`. The
//! optimistic coordinator treats any `Err` as the trigger for rollback.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::shared::SharedError;

/// Field name -> human-readable message, as shown next to form inputs
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Quantities added to the cart must be at least one
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: u64, quantity: u32 },

    /// Persisted blob was written by a newer schema
    #[error("Unsupported persisted state version {found} (current is {current})")]
    UnsupportedVersion { found: u32, current: u32 },

    /// Checkout requires an identified user
    #[error("You must be signed in to check out")]
    NotSignedIn,

    /// Checkout requires at least one cart line
    #[error("Your cart is empty")]
    EmptyCart,

    /// One or more form fields failed validation
    #[error("{} field(s) failed validation", .0.len())]
    Validation(FieldErrors),

    /// Checkout step transition that the flow does not allow
    #[error("Invalid checkout step: {0}")]
    InvalidStep(String),

    /// A replayed operation could not be delivered
    #[error("Dispatch of operation {operation_id} failed: {message}")]
    Dispatch { operation_id: String, message: String },

    #[error(transparent)]
    Shared(#[from] SharedError),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Shared(SharedError::from(err))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Shared(SharedError::from(err))
    }
}
