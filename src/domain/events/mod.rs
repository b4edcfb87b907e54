//! Domain events
use crate::domain::value_objects::CartId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { cart_id: CartId, added: u32, quantity: u32 },
    QuantityChanged { cart_id: CartId, from: u32, to: u32 },
    /// A quantity edit asked for more than the stock ceiling allowed.
    QuantityClamped { cart_id: CartId, requested: i64, ceiling: u32 },
    ItemRemoved { cart_id: CartId },
    Cleared,
}

impl CartEvent {
    pub fn cart_id(&self) -> Option<&CartId> {
        match self {
            Self::ItemAdded { cart_id, .. }
            | Self::QuantityChanged { cart_id, .. }
            | Self::QuantityClamped { cart_id, .. }
            | Self::ItemRemoved { cart_id } => Some(cart_id),
            Self::Cleared => None,
        }
    }
}
