//! Gourmet Cart
//!
//! Client-side shopping cart for a storefront selling traceable gourmet
//! products, sold either at a single price or in weight tiers.
//!
//! ## Features
//! - Line items keyed by product and weight option, merged on repeat adds
//! - Stock ceilings enforced on add (fail fast) and on edits (clamp)
//! - Subtotal, flat-rate shipping with a free-shipping threshold, total
//! - Persistence that survives reloads and heals corrupt data
//! - Display and checkout-summary projections refreshed on every change
//! - Order handoff to an external checkout collaborator

pub mod checkout;
pub mod config;
pub mod domain;
pub mod engine;
pub mod projector;
pub mod store;

pub use checkout::{checkout, CheckoutError, OrderConfirmation, OrderSubmitter, OutboxSubmitter};
pub use config::{CartConfig, ConfigError};
pub use domain::{
    Cart, CartEvent, CartId, CartTotals, CatalogError, CatalogItem, CatalogRecord, LineItem, Money, OrderDraft,
    ProductId, ShippingPolicy,
};
pub use engine::{CartEngine, CartListener, CartState};
pub use projector::{CartDisplay, CheckoutSummary, PriceFormat};
pub use store::{CartStore, FileSlot, MemorySlot, StorageSlot, StoreError};

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors surfaced to the shopper by cart mutations.
#[derive(Error, Debug)]
pub enum CartError {
    #[error("Only {available} left in stock")]
    InsufficientStock { available: u32 },

    #[error("Invalid quantity")]
    InvalidQuantity,

    #[error("Order amount too large")]
    AmountTooLarge,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, CartError>;
