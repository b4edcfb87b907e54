//! Order handoff.
//!
//! The cart does not place orders itself. [`checkout`] freezes the cart into
//! an [`OrderDraft`], hands it to an [`OrderSubmitter`], and empties the cart
//! only once the submitter confirms.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Money, OrderDraft, OrderError};
use crate::engine::CartEngine;
use crate::store::StorageSlot;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Order submission failed: {0}")]
    Submission(String),

    #[error("Outbox I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode order: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Acknowledgement from the checkout collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub reference: Uuid,
    pub total: Money,
    pub accepted_at: DateTime<Utc>,
}

/// The external party that turns a draft into an order.
pub trait OrderSubmitter {
    fn submit(&mut self, order: &OrderDraft) -> Result<OrderConfirmation, CheckoutError>;
}

/// Writes each order as `<reference>.json` into a directory that a
/// downstream process drains.
#[derive(Clone, Debug)]
pub struct OutboxSubmitter {
    dir: PathBuf,
}

impl OutboxSubmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }
    pub fn path_for(&self, reference: &Uuid) -> PathBuf { self.dir.join(format!("{reference}.json")) }
}

impl OrderSubmitter for OutboxSubmitter {
    fn submit(&mut self, order: &OrderDraft) -> Result<OrderConfirmation, CheckoutError> {
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_string_pretty(order)?;
        fs::write(self.path_for(&order.reference), body)?;
        Ok(OrderConfirmation { reference: order.reference, total: order.total, accepted_at: Utc::now() })
    }
}

/// Submits the cart and clears it on success. On any failure the cart is
/// left exactly as it was.
pub fn checkout<S: StorageSlot>(
    engine: &mut CartEngine<S>,
    submitter: &mut impl OrderSubmitter,
    customer_email: Option<String>,
) -> Result<OrderConfirmation, CheckoutError> {
    let items = engine.items();
    let draft = OrderDraft::create(&items, &engine.aggregates(), customer_email)?;
    match submitter.submit(&draft) {
        Ok(confirmation) => {
            info!(reference = %confirmation.reference, total = %confirmation.total, items = draft.item_count(), "Order submitted");
            engine.clear();
            Ok(confirmation)
        }
        Err(e) => {
            warn!(reference = %draft.reference, error = %e, "Order submission failed, cart kept");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogItem, ProductId, ShippingPolicy};
    use crate::store::{CartStore, MemorySlot};

    struct Rejecting;
    impl OrderSubmitter for Rejecting {
        fn submit(&mut self, _order: &OrderDraft) -> Result<OrderConfirmation, CheckoutError> {
            Err(CheckoutError::Submission("payment declined".into()))
        }
    }

    fn filled_engine() -> CartEngine<MemorySlot> {
        let mut engine = CartEngine::new(CartStore::new(MemorySlot::new(), "cart"), ShippingPolicy::default());
        let item = CatalogItem::simple(ProductId::new("saffron").unwrap(), "Saffron", Money::from_cents(2450), 4);
        engine.add_item(&item, 2, None).unwrap();
        engine
    }

    #[test]
    fn test_checkout_writes_outbox_and_clears() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut outbox = OutboxSubmitter::new(dir.path());
        let mut engine = filled_engine();

        let confirmation = checkout(&mut engine, &mut outbox, None).unwrap();
        assert_eq!(confirmation.total, Money::from_cents(5650));
        assert!(engine.is_empty());

        let raw = fs::read_to_string(outbox.path_for(&confirmation.reference)).unwrap();
        let draft: OrderDraft = serde_json::from_str(&raw).unwrap();
        assert_eq!(draft.items[0].quantity, 2);
        assert_eq!(draft.subtotal, Money::from_cents(4900));
    }

    #[test]
    fn test_failed_submission_keeps_cart() {
        let mut engine = filled_engine();
        assert!(matches!(checkout(&mut engine, &mut Rejecting, None), Err(CheckoutError::Submission(_))));
        assert_eq!(engine.aggregates().item_count, 2);
    }

    #[test]
    fn test_empty_cart_cannot_check_out() {
        let mut engine = CartEngine::new(CartStore::new(MemorySlot::new(), "cart"), ShippingPolicy::default());
        let dir = tempfile::TempDir::new().unwrap();
        let result = checkout(&mut engine, &mut OutboxSubmitter::new(dir.path()), None);
        assert!(matches!(result, Err(CheckoutError::Order(OrderError::NoItems))));
    }
}
