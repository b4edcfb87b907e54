//! Order Draft
//!
//! The payload handed to the checkout collaborator. It is a frozen copy of
//! the cart at submission time; the cart itself is only cleared once the
//! collaborator confirms the order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::cart::{CartTotals, LineItem};
use crate::domain::value_objects::{Money, ProductId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub reference: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<OrderLine>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub customer_email: Option<String>,
    pub placed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine { pub product_id: ProductId, pub variant_id: Option<String>, pub quantity: u32, pub unit_price: Money }

impl From<&LineItem> for OrderLine {
    fn from(item: &LineItem) -> Self {
        Self { product_id: item.product_id.clone(), variant_id: item.variant_id.clone(), quantity: item.quantity, unit_price: item.unit_price }
    }
}

impl OrderDraft {
    pub fn create(items: &[LineItem], totals: &CartTotals, customer_email: Option<String>) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let draft = Self {
            reference: Uuid::new_v4(),
            items: items.iter().map(OrderLine::from).collect(),
            subtotal: totals.subtotal,
            shipping_fee: totals.shipping_fee,
            total: totals.total,
            customer_email: customer_email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            placed_at: Utc::now(),
        };
        draft.validate().map_err(|e| OrderError::Invalid(e.to_string()))?;
        Ok(draft)
    }

    pub fn item_count(&self) -> u32 { self.items.iter().fold(0u32, |acc, l| acc.saturating_add(l.quantity)) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { NoItems, Invalid(String) }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::NoItems => write!(f, "No items"), Self::Invalid(e) => write!(f, "Invalid order: {e}") }
    }
}
