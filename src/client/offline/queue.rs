//! # Pending Operation Queue
//!
//! Records every cart/wishlist mutation made while offline so it can be
//! resubmitted once connectivity returns.
//!
//! ## Features
//!
//! - **Persistent Queue**: Operations survive restarts (the queue is part of
//!   the persisted store blob)
//! - **Insertion Order**: Operations replay in the order they were made
//! - **Retry Bookkeeping**: Attempt count, next attempt time and last error
//!   per operation
//!
//! ## Wire format
//!
//! ```json
//! { "id": "add-to-cart-7-1718000000000", "type": "ADD_TO_CART",
//!   "payload": { "product": { ... }, "quantity": 2 }, "timestamp": 1718000000000 }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luxemarket::client::offline::queue::{Operation, PendingOperation, PendingQueue};
//!
//! let mut queue = PendingQueue::new();
//! queue.push(PendingOperation::new(Operation::RemoveFromCart { product_id: 7 }));
//! assert_eq!(queue.len(), 1);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::client::store::models::WishlistItem;
use crate::shared::{Product, ProductSummary, SharedError};

/// Kind of queued mutation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    AddToCart,
    RemoveFromCart,
    UpdateQuantity,
    AddToWishlist,
    RemoveFromWishlist,
    ClearCart,
    ClearWishlist,
}

impl OperationKind {
    /// Prefix used when deriving operation ids
    pub fn slug(&self) -> &'static str {
        match self {
            OperationKind::AddToCart => "add-to-cart",
            OperationKind::RemoveFromCart => "remove-from-cart",
            OperationKind::UpdateQuantity => "update-quantity",
            OperationKind::AddToWishlist => "add-to-wishlist",
            OperationKind::RemoveFromWishlist => "remove-from-wishlist",
            OperationKind::ClearCart => "clear-cart",
            OperationKind::ClearWishlist => "clear-wishlist",
        }
    }
}

/// Product data carried in add payloads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationProduct {
    pub id: u64,
    pub title: String,
    pub price: Decimal,
    pub image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl From<&Product> for OperationProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
        }
    }
}

impl From<&WishlistItem> for OperationProduct {
    fn from(item: &WishlistItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            price: item.price,
            image: item.image.clone(),
            category: item.category.clone(),
            description: item.description.clone(),
        }
    }
}

impl From<&ProductSummary> for OperationProduct {
    fn from(summary: &ProductSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title.clone(),
            price: summary.price,
            image: summary.image.clone(),
            category: String::new(),
            description: String::new(),
        }
    }
}

/// A mutation that can be queued
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AddToCart { product: OperationProduct, quantity: u32 },
    RemoveFromCart { product_id: u64 },
    UpdateQuantity { product_id: u64, quantity: i64 },
    AddToWishlist { product: OperationProduct },
    RemoveFromWishlist { product_id: u64 },
    ClearCart,
    ClearWishlist,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::AddToCart { .. } => OperationKind::AddToCart,
            Operation::RemoveFromCart { .. } => OperationKind::RemoveFromCart,
            Operation::UpdateQuantity { .. } => OperationKind::UpdateQuantity,
            Operation::AddToWishlist { .. } => OperationKind::AddToWishlist,
            Operation::RemoveFromWishlist { .. } => OperationKind::RemoveFromWishlist,
            Operation::ClearCart => OperationKind::ClearCart,
            Operation::ClearWishlist => OperationKind::ClearWishlist,
        }
    }

    /// Product the operation touches; `None` for whole-collection clears
    pub fn target_id(&self) -> Option<u64> {
        match self {
            Operation::AddToCart { product, .. } | Operation::AddToWishlist { product } => {
                Some(product.id)
            }
            Operation::RemoveFromCart { product_id }
            | Operation::UpdateQuantity { product_id, .. }
            | Operation::RemoveFromWishlist { product_id } => Some(*product_id),
            Operation::ClearCart | Operation::ClearWishlist => None,
        }
    }

    fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Operation::AddToCart { product, quantity } => {
                serde_json::to_value(AddToCartPayload { product: product.clone(), quantity: *quantity })
            }
            Operation::AddToWishlist { product } => {
                serde_json::to_value(AddToWishlistPayload { product: product.clone() })
            }
            Operation::RemoveFromCart { product_id } | Operation::RemoveFromWishlist { product_id } => {
                serde_json::to_value(ProductIdPayload { product_id: *product_id })
            }
            Operation::UpdateQuantity { product_id, quantity } => {
                serde_json::to_value(UpdateQuantityPayload { product_id: *product_id, quantity: *quantity })
            }
            Operation::ClearCart | Operation::ClearWishlist => Ok(serde_json::json!({})),
        }
    }

    fn from_payload(kind: OperationKind, payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            OperationKind::AddToCart => {
                let p: AddToCartPayload = serde_json::from_value(payload)?;
                Operation::AddToCart { product: p.product, quantity: p.quantity }
            }
            OperationKind::AddToWishlist => {
                let p: AddToWishlistPayload = serde_json::from_value(payload)?;
                Operation::AddToWishlist { product: p.product }
            }
            OperationKind::RemoveFromCart => {
                let p: ProductIdPayload = serde_json::from_value(payload)?;
                Operation::RemoveFromCart { product_id: p.product_id }
            }
            OperationKind::RemoveFromWishlist => {
                let p: ProductIdPayload = serde_json::from_value(payload)?;
                Operation::RemoveFromWishlist { product_id: p.product_id }
            }
            OperationKind::UpdateQuantity => {
                let p: UpdateQuantityPayload = serde_json::from_value(payload)?;
                Operation::UpdateQuantity { product_id: p.product_id, quantity: p.quantity }
            }
            OperationKind::ClearCart => Operation::ClearCart,
            OperationKind::ClearWishlist => Operation::ClearWishlist,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct AddToCartPayload {
    product: OperationProduct,
    quantity: u32,
}

#[derive(Serialize, Deserialize)]
struct AddToWishlistPayload {
    product: OperationProduct,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductIdPayload {
    product_id: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateQuantityPayload {
    product_id: u64,
    quantity: i64,
}

/// A queued operation with replay metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireOperation", into = "WireOperation")]
pub struct PendingOperation {
    /// `<kind>-<target>-<millis>`, unique within the queue
    pub id: String,
    pub operation: Operation,
    /// When the operation was enqueued
    pub timestamp: DateTime<Utc>,
    /// Failed delivery attempts so far
    pub attempts: u32,
    /// Earliest time the next attempt may run; `None` means now
    pub next_attempt_at: Option<DateTime<Utc>>,
    /// Error message from the last failed attempt
    pub last_error: Option<String>,
}

impl PendingOperation {
    /// Create an operation stamped with the current time
    pub fn new(operation: Operation) -> Self {
        Self::at(operation, Utc::now())
    }

    /// Create an operation stamped with `timestamp`
    pub fn at(operation: Operation, timestamp: DateTime<Utc>) -> Self {
        let target = operation
            .target_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "all".to_string());
        let id = format!("{}-{}-{}", operation.kind().slug(), target, timestamp.timestamp_millis());
        Self {
            id,
            operation,
            timestamp,
            attempts: 0,
            next_attempt_at: None,
            last_error: None,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    /// Whether the operation may be attempted at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_attempt_at.map_or(true, |at| at <= now)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOperation {
    id: String,
    #[serde(rename = "type")]
    kind: OperationKind,
    #[serde(default)]
    payload: serde_json::Value,
    /// Milliseconds since the epoch
    timestamp: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl TryFrom<WireOperation> for PendingOperation {
    type Error = SharedError;

    fn try_from(wire: WireOperation) -> Result<Self, Self::Error> {
        let operation = Operation::from_payload(wire.kind, wire.payload)?;
        let timestamp = Utc
            .timestamp_millis_opt(wire.timestamp)
            .single()
            .ok_or_else(|| SharedError::serialization(format!("invalid timestamp {}", wire.timestamp)))?;
        Ok(Self {
            id: wire.id,
            operation,
            timestamp,
            attempts: wire.attempts,
            next_attempt_at: wire.next_attempt_at,
            last_error: wire.last_error,
        })
    }
}

impl From<PendingOperation> for WireOperation {
    fn from(op: PendingOperation) -> Self {
        let payload = op.operation.payload().unwrap_or_else(|e| {
            tracing::error!("Failed to encode payload for {}: {}", op.id, e);
            serde_json::Value::Null
        });
        Self {
            kind: op.operation.kind(),
            id: op.id,
            payload,
            timestamp: op.timestamp.timestamp_millis(),
            attempts: op.attempts,
            next_attempt_at: op.next_attempt_at,
            last_error: op.last_error,
        }
    }
}

/// Insertion-ordered queue of pending operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingQueue {
    operations: Vec<PendingOperation>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation, suffixing its id if the same id is already queued
    ///
    /// Returns the id the operation was stored under.
    pub fn push(&mut self, mut operation: PendingOperation) -> String {
        if self.contains(&operation.id) {
            let base = operation.id.clone();
            let mut n = 1;
            while self.contains(&format!("{}-{}", base, n)) {
                n += 1;
            }
            operation.id = format!("{}-{}", base, n);
        }
        let id = operation.id.clone();
        self.operations.push(operation);
        id
    }

    /// Remove an operation by id, returning it if present
    pub fn remove(&mut self, id: &str) -> Option<PendingOperation> {
        let index = self.operations.iter().position(|op| op.id == id)?;
        Some(self.operations.remove(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.operations.iter().any(|op| op.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&PendingOperation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Record a failed attempt and when to try again
    pub fn record_failure(&mut self, id: &str, error: String, next_attempt_at: DateTime<Utc>) -> Option<u32> {
        let op = self.operations.iter_mut().find(|op| op.id == id)?;
        op.attempts += 1;
        op.last_error = Some(error);
        op.next_attempt_at = Some(next_attempt_at);
        Some(op.attempts)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Take every operation out, oldest first
    pub fn drain(&mut self) -> Vec<PendingOperation> {
        std::mem::take(&mut self.operations)
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}
