//! Cart Aggregate

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::CatalogItem;
use crate::domain::events::CartEvent;
use crate::domain::value_objects::{CartId, Money, ProductId};
use crate::{CartError, Result};

/// One row of the cart. Field names match the persisted layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub cart_id: CartId,
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub display_name: String,
    /// Price at the moment the item was first added.
    pub unit_price: Money,
    pub quantity: u32,
    pub stock_ceiling: u32,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub source_slug: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }

    /// The line total at the highest quantity an edit can reach.
    fn max_line_total(&self) -> Option<Money> { self.unit_price.checked_multiply(self.quantity.max(self.stock_ceiling)) }
}

/// Flat-fee shipping that becomes free at a subtotal threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShippingPolicy { pub free_threshold: Money, pub flat_fee: Money }

impl Default for ShippingPolicy {
    fn default() -> Self { Self { free_threshold: Money::from_cents(7500), flat_fee: Money::from_cents(750) } }
}

impl ShippingPolicy {
    pub fn fee_for(&self, subtotal: &Money) -> Money {
        if subtotal.is_zero() || *subtotal >= self.free_threshold { Money::ZERO } else { self.flat_fee }
    }
}

/// Derived figures; computed on every read, never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals { pub subtotal: Money, pub shipping_fee: Money, pub total: Money, pub item_count: u32 }

#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<LineItem>,
    events: Vec<CartEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from persisted rows, dropping rows that break the
    /// cart's invariants: zero quantity, a cart id that does not match the
    /// row's product and variant, a repeated cart id, or amounts too large
    /// to total.
    pub fn from_items(rows: Vec<LineItem>) -> Self {
        let mut items: Vec<LineItem> = Vec::with_capacity(rows.len());
        let mut subtotal = Money::ZERO;
        for row in rows {
            if row.quantity == 0 || row.cart_id != CartId::for_item(&row.product_id, row.variant_id.as_deref()) { continue; }
            if items.iter().any(|i| i.cart_id == row.cart_id) { continue; }
            let Some(next) = row.max_line_total().and_then(|t| subtotal.checked_add(&t)) else { continue };
            subtotal = next;
            items.push(row);
        }
        Self { items, events: vec![] }
    }

    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn get(&self, cart_id: &CartId) -> Option<&LineItem> { self.items.iter().find(|i| &i.cart_id == cart_id) }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn len(&self) -> usize { self.items.len() }

    /// Adds `quantity` of the chosen product/variant, merging into an existing
    /// row. Fails without touching the cart when the merged quantity would
    /// exceed current stock. Returns the row's resulting quantity.
    pub fn add(&mut self, item: &CatalogItem, variant_id: Option<&str>, quantity: u32) -> Result<u32> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        let selection = item.resolve(variant_id)?;
        let cart_id = CartId::for_item(&item.id, selection.variant_id.as_deref());

        let current = self.get(&cart_id).map_or(0, |i| i.quantity);
        let proposed = current.saturating_add(quantity);
        if proposed > selection.stock { return Err(CartError::InsufficientStock { available: selection.stock }); }
        self.check_amounts(&cart_id, selection.unit_price, selection.stock)?;

        if let Some(existing) = self.items.iter_mut().find(|i| i.cart_id == cart_id) {
            existing.quantity = proposed;
            existing.stock_ceiling = selection.stock;
        } else {
            self.items.push(LineItem {
                cart_id: cart_id.clone(),
                product_id: item.id.clone(),
                variant_id: selection.variant_id,
                display_name: selection.display_name,
                unit_price: selection.unit_price,
                quantity,
                stock_ceiling: selection.stock,
                image_ref: item.image.clone(),
                source_slug: item.slug.clone(),
            });
        }

        let resulting = self.get(&cart_id).map_or(quantity, |i| i.quantity);
        self.raise_event(CartEvent::ItemAdded { cart_id, added: quantity, quantity: resulting });
        Ok(resulting)
    }

    /// Sets a row's quantity: zero or less removes it, more than the stock
    /// ceiling clamps to the ceiling. Returns false when the row is absent.
    pub fn set_quantity(&mut self, cart_id: &CartId, quantity: i64) -> bool {
        let Some(pos) = self.items.iter().position(|i| &i.cart_id == cart_id) else { return false };
        let ceiling = self.items[pos].stock_ceiling;
        let target = if quantity > i64::from(ceiling) {
            self.raise_event(CartEvent::QuantityClamped { cart_id: cart_id.clone(), requested: quantity, ceiling });
            ceiling
        } else {
            u32::try_from(quantity.max(0)).unwrap_or(0)
        };

        if target == 0 {
            self.items.remove(pos);
            self.raise_event(CartEvent::ItemRemoved { cart_id: cart_id.clone() });
        } else {
            let from = std::mem::replace(&mut self.items[pos].quantity, target);
            self.raise_event(CartEvent::QuantityChanged { cart_id: cart_id.clone(), from, to: target });
        }
        true
    }

    /// Returns false when nothing was removed.
    pub fn remove(&mut self, cart_id: &CartId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.cart_id != cart_id);
        if self.items.len() == before { return false; }
        self.raise_event(CartEvent::ItemRemoved { cart_id: cart_id.clone() });
        true
    }

    pub fn clear(&mut self) { self.items.clear(); self.raise_event(CartEvent::Cleared); }

    pub fn totals(&self, policy: &ShippingPolicy) -> CartTotals {
        let subtotal = self.items.iter().fold(Money::ZERO, |acc, i| acc.add(&i.line_total()));
        let shipping_fee = policy.fee_for(&subtotal);
        let item_count = self.items.iter().fold(0u32, |acc, i| acc.saturating_add(i.quantity));
        CartTotals { subtotal, shipping_fee, total: subtotal.add(&shipping_fee), item_count }
    }

    /// Fails when the row for `cart_id`, filled to `ceiling` at
    /// `unit_price`, would push the subtotal past what `Money` can hold.
    fn check_amounts(&self, cart_id: &CartId, unit_price: Money, ceiling: u32) -> Result<()> {
        // Merges keep the first-added price.
        let price = self.get(cart_id).map_or(unit_price, |i| i.unit_price);
        let others = self.items.iter().filter(|i| &i.cart_id != cart_id);
        others
            .map(LineItem::max_line_total)
            .try_fold(Money::ZERO, |acc, t| t.and_then(|t| acc.checked_add(&t)))
            .and_then(|acc| price.checked_multiply(ceiling).and_then(|t| acc.checked_add(&t)))
            .map(|_| ())
            .ok_or(CartError::AmountTooLarge)
    }

    pub fn take_events(&mut self) -> Vec<CartEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(e); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::WeightOption;

    fn oil(stock: u32) -> CatalogItem {
        CatalogItem::simple(ProductId::new("oil").unwrap(), "Truffle Oil", Money::from_cents(2000), stock)
    }

    fn truffle() -> CatalogItem {
        CatalogItem::varianted(ProductId::new("truffle").unwrap(), "Truffle X", vec![
            WeightOption { id: "50".into(), weight_grams: 50, price: Money::from_cents(4000), stock: 5 },
            WeightOption { id: "100".into(), weight_grams: 100, price: Money::from_cents(7500), stock: 2 },
        ])
    }

    #[test]
    fn test_merge_same_identity() {
        let mut cart = Cart::new();
        cart.add(&oil(10), None, 2).unwrap();
        assert_eq!(cart.add(&oil(10), None, 3).unwrap(), 5);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_variants_are_separate_rows() {
        let mut cart = Cart::new();
        cart.add(&truffle(), Some("50"), 1).unwrap();
        cart.add(&truffle(), Some("100"), 1).unwrap();
        cart.add(&truffle(), Some("50"), 2).unwrap();
        assert_eq!(cart.len(), 2);
        let row = cart.get(&CartId::from("truffle_50")).unwrap();
        assert_eq!(row.quantity, 3);
        assert_eq!(row.display_name, "Truffle X (50g)");
    }

    #[test]
    fn test_add_fails_fast_over_stock() {
        let mut cart = Cart::new();
        cart.add(&oil(10), None, 8).unwrap();
        cart.take_events();
        let err = cart.add(&oil(10), None, 3).unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { available: 10 }));
        assert_eq!(cart.items()[0].quantity, 8);
        assert!(cart.take_events().is_empty());
    }

    #[test]
    fn test_add_new_row_over_stock() {
        let mut cart = Cart::new();
        assert!(matches!(cart.add(&truffle(), Some("100"), 3), Err(CartError::InsufficientStock { available: 2 })));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_quantity() {
        let mut cart = Cart::new();
        assert!(matches!(cart.add(&oil(10), None, 0), Err(CartError::InvalidQuantity)));
    }

    #[test]
    fn test_price_snapshot_kept_on_merge() {
        let mut cart = Cart::new();
        cart.add(&oil(10), None, 1).unwrap();
        let repriced = CatalogItem::simple(ProductId::new("oil").unwrap(), "Truffle Oil", Money::from_cents(2500), 10);
        cart.add(&repriced, None, 1).unwrap();
        assert_eq!(cart.items()[0].unit_price, Money::from_cents(2000));
    }

    #[test]
    fn test_set_quantity_clamps_and_removes() {
        let mut cart = Cart::new();
        cart.add(&oil(4), None, 1).unwrap();
        let id = CartId::from("oil");
        assert!(cart.set_quantity(&id, 9));
        assert_eq!(cart.items()[0].quantity, 4);
        assert!(cart.set_quantity(&id, 2));
        assert_eq!(cart.items()[0].quantity, 2);
        assert!(cart.set_quantity(&id, -1));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity(&id, 3));
    }

    #[test]
    fn test_remove_idempotent() {
        let mut cart = Cart::new();
        cart.add(&oil(4), None, 1).unwrap();
        assert!(cart.remove(&CartId::from("oil")));
        assert!(!cart.remove(&CartId::from("oil")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        let policy = ShippingPolicy::default();
        cart.add(&oil(10), None, 2).unwrap();
        cart.add(&CatalogItem::simple(ProductId::new("salt").unwrap(), "Salt", Money::from_cents(1000), 5), None, 1).unwrap();
        let totals = cart.totals(&policy);
        assert_eq!(totals.subtotal, Money::from_cents(5000));
        assert_eq!(totals.shipping_fee, Money::from_cents(750));
        assert_eq!(totals.total, Money::from_cents(5750));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_free_shipping_boundary() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.fee_for(&Money::from_cents(7500)), Money::ZERO);
        assert_eq!(policy.fee_for(&Money::from_cents(7499)), Money::from_cents(750));
        assert_eq!(policy.fee_for(&Money::ZERO), Money::ZERO);
    }

    #[test]
    fn test_from_items_drops_invalid_rows() {
        let mut cart = Cart::new();
        cart.add(&oil(10), None, 2).unwrap();
        let mut rows = cart.items().to_vec();
        rows.push(rows[0].clone());
        let mut zero = rows[0].clone();
        zero.cart_id = CartId::from("other");
        zero.quantity = 0;
        rows.push(zero);
        assert_eq!(Cart::from_items(rows).len(), 1);
    }

    #[test]
    fn test_from_items_drops_mismatched_cart_id() {
        let mut cart = Cart::new();
        cart.add(&oil(10), None, 1).unwrap();
        let mut legacy = cart.items()[0].clone();
        legacy.cart_id = CartId::from("legacy-key");
        let mut restored = Cart::from_items(vec![legacy]);
        assert!(restored.is_empty());

        restored.add(&oil(10), None, 1).unwrap();
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_from_items_drops_unpriceable_rows() {
        let mut cart = Cart::new();
        cart.add(&oil(10), None, 2).unwrap();
        let mut huge = cart.items()[0].clone();
        huge.unit_price = Money::new(rust_decimal::Decimal::MAX).unwrap();
        let mut rows = vec![huge];
        rows.extend(cart.items().iter().cloned());

        let restored = Cart::from_items(rows);
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.totals(&ShippingPolicy::default()).subtotal, Money::from_cents(4000));
    }

    #[test]
    fn test_add_rejects_amount_overflow() {
        let mut cart = Cart::new();
        let priceless = CatalogItem::simple(
            ProductId::new("gold").unwrap(), "Gold Leaf", Money::new(rust_decimal::Decimal::MAX).unwrap(), 5);
        assert!(matches!(cart.add(&priceless, None, 2), Err(CartError::AmountTooLarge)));
        assert!(cart.is_empty());
        assert!(cart.take_events().is_empty());

        let near_max = Money::new(rust_decimal::Decimal::MAX - rust_decimal::Decimal::from(10)).unwrap();
        cart.add(&CatalogItem::simple(ProductId::new("a").unwrap(), "A", near_max, 1), None, 1).unwrap();
        let err = cart.add(&oil(1), None, 1).unwrap_err();
        assert!(matches!(err, CartError::AmountTooLarge));
        assert_eq!(cart.len(), 1);
        let _ = cart.totals(&ShippingPolicy::default());
    }

    #[test]
    fn test_clamp_to_zero_ceiling_removes_line() {
        let mut cart = Cart::new();
        cart.add(&oil(3), None, 1).unwrap();
        let mut sold_out = cart.items()[0].clone();
        sold_out.stock_ceiling = 0;
        let mut cart = Cart::from_items(vec![sold_out]);
        let id = CartId::from("oil");

        assert!(cart.set_quantity(&id, 5));
        assert!(cart.is_empty());
        let events = cart.take_events();
        assert!(events.iter().any(|e| matches!(e, CartEvent::QuantityClamped { ceiling: 0, .. })));
        assert!(matches!(events.last(), Some(CartEvent::ItemRemoved { cart_id }) if cart_id == &id));
    }
}
