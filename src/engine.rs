//! The cart engine: sole writer of the cart.
//!
//! Every mutation runs synchronously, persists through the [`CartStore`],
//! then notifies each registered [`CartListener`] with a read-only view of
//! the new state. Listeners never see the store.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::domain::{Cart, CartEvent, CartId, CartTotals, CatalogItem, LineItem, ShippingPolicy};
use crate::store::{CartStore, StorageSlot};
use crate::Result;

/// What a listener sees after a change.
#[derive(Debug, Clone, Copy)]
pub struct CartState<'a> {
    pub items: &'a [LineItem],
    pub totals: CartTotals,
    /// Events raised by the mutation that triggered this refresh; empty for
    /// the initial render and after a reload.
    pub events: &'a [CartEvent],
}

/// Anything that re-renders from cart state.
pub trait CartListener {
    fn refresh(&mut self, state: &CartState<'_>);
}

impl<L: CartListener> CartListener for Rc<RefCell<L>> {
    fn refresh(&mut self, state: &CartState<'_>) { self.borrow_mut().refresh(state); }
}

pub struct CartEngine<S> {
    cart: Cart,
    store: CartStore<S>,
    shipping: ShippingPolicy,
    listeners: Vec<Box<dyn CartListener>>,
}

impl<S: StorageSlot> CartEngine<S> {
    /// Builds the engine from whatever the store holds.
    pub fn new(store: CartStore<S>, shipping: ShippingPolicy) -> Self {
        let cart = store.load();
        Self { cart, store, shipping, listeners: Vec::new() }
    }

    /// Registers a listener and renders the current state into it.
    pub fn subscribe(&mut self, mut listener: impl CartListener + 'static) {
        listener.refresh(&self.state(&[]));
        self.listeners.push(Box::new(listener));
    }

    /// Adds `quantity` of a catalog item (or one of its weight options).
    ///
    /// Returns the line's resulting quantity. A stock violation leaves the
    /// cart untouched and reports how many are available.
    pub fn add_item(&mut self, item: &CatalogItem, quantity: u32, variant_id: Option<&str>) -> Result<u32> {
        match self.cart.add(item, variant_id, quantity) {
            Ok(resulting) => {
                debug!(product = %item.id, variant = ?variant_id, quantity, resulting, "Item added");
                self.commit();
                Ok(resulting)
            }
            Err(e) => {
                debug!(product = %item.id, variant = ?variant_id, quantity, error = %e, "Add rejected");
                Err(e)
            }
        }
    }

    /// Zero or negative removes the line; above the stock ceiling clamps.
    /// Unknown ids are ignored.
    pub fn set_quantity(&mut self, cart_id: &CartId, quantity: i64) {
        if self.cart.set_quantity(cart_id, quantity) {
            debug!(%cart_id, quantity, "Quantity set");
            self.commit();
        }
    }

    pub fn remove_item(&mut self, cart_id: &CartId) {
        if self.cart.remove(cart_id) {
            debug!(%cart_id, "Item removed");
        }
        self.commit();
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        info!("Cart cleared");
        self.commit();
    }

    /// Re-reads persisted state, discarding the in-memory cart.
    pub fn reload(&mut self) {
        self.cart = self.store.load();
        self.notify(&[]);
    }

    pub fn aggregates(&self) -> CartTotals { self.cart.totals(&self.shipping) }

    /// Snapshot of the current lines in insertion order.
    pub fn items(&self) -> Vec<LineItem> { self.cart.items().to_vec() }

    pub fn get(&self, cart_id: &CartId) -> Option<&LineItem> { self.cart.get(cart_id) }

    pub fn is_empty(&self) -> bool { self.cart.is_empty() }

    fn state<'a>(&'a self, events: &'a [CartEvent]) -> CartState<'a> {
        CartState { items: self.cart.items(), totals: self.aggregates(), events }
    }

    fn commit(&mut self) {
        self.store.save(self.cart.items());
        let events = self.cart.take_events();
        self.notify(&events);
    }

    fn notify(&mut self, events: &[CartEvent]) {
        let mut listeners = std::mem::take(&mut self.listeners);
        let state = self.state(events);
        for listener in &mut listeners {
            listener.refresh(&state);
        }
        self.listeners = listeners;
    }
}
