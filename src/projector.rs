//! Views re-rendered from the cart engine.
//!
//! Both projectors are plain [`CartListener`]s: they hold nothing but their
//! last render and rebuild it from scratch on each notification.

use std::fmt::Write as _;

use crate::domain::{CartEvent, CartId, LineItem, Money, ShippingPolicy};
use crate::engine::{CartListener, CartState};

/// Price formatting for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceFormat {
    symbol: String,
}

impl PriceFormat {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self { Self { symbol: symbol.into() } }

    /// Format an amount, e.g. `€12.50`.
    #[must_use]
    pub fn format(&self, money: &Money) -> String { format!("{}{money}", self.symbol) }
}

impl Default for PriceFormat {
    fn default() -> Self { Self::new("€") }
}

/// Cart row display data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItemView {
    pub cart_id: CartId,
    pub title: String,
    pub quantity: u32,
    /// Upper bound for the quantity input.
    pub max_quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    /// Row touched by the latest change, for highlighting.
    pub last_changed: Option<CartId>,
}

impl CartView {
    #[must_use]
    pub fn empty(format: &PriceFormat) -> Self {
        Self { items: Vec::new(), subtotal: format.format(&Money::ZERO), item_count: 0, last_changed: None }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

/// Cart page and header badge.
#[derive(Debug)]
pub struct CartDisplay {
    format: PriceFormat,
    view: CartView,
}

impl CartDisplay {
    #[must_use]
    pub fn new(format: PriceFormat) -> Self {
        let view = CartView::empty(&format);
        Self { format, view }
    }

    pub fn view(&self) -> &CartView { &self.view }

    /// Plain-text rendering of the cart.
    #[must_use]
    pub fn render_text(&self) -> String {
        if self.view.is_empty() {
            return "Your cart is empty.\n".to_string();
        }
        let mut out = String::new();
        for row in &self.view.items {
            let marker = if self.view.last_changed.as_ref() == Some(&row.cart_id) { '*' } else { ' ' };
            let _ = writeln!(
                out,
                "{marker} {:<32} {:>3} x {:>10} = {:>10}   [{}]",
                row.title, row.quantity, row.price, row.line_price, row.cart_id
            );
        }
        let _ = writeln!(out, "  {} item(s), subtotal {}", self.view.item_count, self.view.subtotal);
        out
    }

    fn row(&self, item: &LineItem) -> CartItemView {
        CartItemView {
            cart_id: item.cart_id.clone(),
            title: item.display_name.clone(),
            quantity: item.quantity,
            max_quantity: item.stock_ceiling,
            price: self.format.format(&item.unit_price),
            line_price: self.format.format(&item.line_total()),
            image: item.image_ref.clone(),
        }
    }
}

impl CartListener for CartDisplay {
    fn refresh(&mut self, state: &CartState<'_>) {
        let last_changed = state
            .events
            .iter()
            .rev()
            .filter(|e| !matches!(e, CartEvent::ItemRemoved { .. }))
            .find_map(CartEvent::cart_id)
            .cloned();
        self.view = CartView {
            items: state.items.iter().map(|i| self.row(i)).collect(),
            subtotal: self.format.format(&state.totals.subtotal),
            item_count: state.totals.item_count,
            last_changed,
        };
    }
}

/// Payment page totals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryView {
    pub item_count: u32,
    pub subtotal: String,
    /// Formatted fee, or "Free".
    pub shipping: String,
    pub total: String,
    /// How much more to spend for free shipping, when shipping is charged.
    pub free_shipping_remaining: Option<String>,
}

#[derive(Debug)]
pub struct CheckoutSummary {
    format: PriceFormat,
    policy: ShippingPolicy,
    view: SummaryView,
}

impl CheckoutSummary {
    #[must_use]
    pub fn new(format: PriceFormat, policy: ShippingPolicy) -> Self {
        let zero = format.format(&Money::ZERO);
        let view = SummaryView {
            item_count: 0,
            subtotal: zero.clone(),
            shipping: "Free".to_string(),
            total: zero,
            free_shipping_remaining: None,
        };
        Self { format, policy, view }
    }

    pub fn view(&self) -> &SummaryView { &self.view }

    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Subtotal: {}", self.view.subtotal);
        let _ = writeln!(out, "Shipping: {}", self.view.shipping);
        let _ = writeln!(out, "Total:    {}", self.view.total);
        if let Some(remaining) = &self.view.free_shipping_remaining {
            let _ = writeln!(out, "Add {remaining} more for free shipping.");
        }
        out
    }
}

impl CartListener for CheckoutSummary {
    fn refresh(&mut self, state: &CartState<'_>) {
        let totals = &state.totals;
        let charged = !totals.shipping_fee.is_zero();
        self.view = SummaryView {
            item_count: totals.item_count,
            subtotal: self.format.format(&totals.subtotal),
            shipping: if charged { self.format.format(&totals.shipping_fee) } else { "Free".to_string() },
            total: self.format.format(&totals.total),
            free_shipping_remaining: charged
                .then(|| self.format.format(&self.policy.free_threshold.saturating_sub(&totals.subtotal))),
        };
    }
}
