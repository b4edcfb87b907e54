//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{CatalogError, CatalogItem, CatalogRecord, Pricing, Selection, WeightOption, WeightOptionRecord};
pub use order::{OrderDraft, OrderError, OrderLine};
pub use cart::{Cart, CartTotals, LineItem, ShippingPolicy};
