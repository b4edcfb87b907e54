//! Pure cart domain: no storage, no logging, no I/O.
pub mod aggregates;
pub mod events;
pub mod value_objects;

pub use aggregates::*;
pub use events::CartEvent;
pub use value_objects::{CartId, IdError, Money, MoneyError, ProductId};
