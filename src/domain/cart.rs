use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MenuItem;

/// A menu item with the quantity ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub item: MenuItem,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(item: MenuItem, quantity: u32) -> Self {
        Self { item, quantity }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn line_total(&self) -> Decimal {
        self.item.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// `None` when the line total does not fit in a `Decimal`.
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.item.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// The customer's basket. Lines keep insertion order and belong to one restaurant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    restaurant_id: Option<String>,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of an item. An item already in the cart has its quantity
    /// increased; an item from another restaurant starts a fresh cart.
    pub fn add(&mut self, restaurant_id: &str, item: MenuItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if self.restaurant_id.as_deref() != Some(restaurant_id) {
            self.items.clear();
            self.restaurant_id = Some(restaurant_id.to_string());
        }
        match self.items.iter_mut().find(|line| line.item.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.items.push(CartItem::new(item, quantity)),
        }
    }

    /// Lowers the quantity by one, dropping the line at zero.
    pub fn decrement(&mut self, item_id: &str) {
        if let Some(pos) = self.items.iter().position(|line| line.item.id == item_id) {
            if self.items[pos].quantity > 1 {
                self.items[pos].quantity -= 1;
            } else {
                self.items.remove(pos);
            }
        }
        self.forget_restaurant_if_empty();
    }

    pub fn remove(&mut self, item_id: &str) {
        self.items.retain(|line| line.item.id != item_id);
        self.forget_restaurant_if_empty();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.restaurant_id = None;
    }

    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant_id.as_deref()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    fn forget_restaurant_if_empty(&mut self) {
        if self.items.is_empty() {
            self.restaurant_id = None;
        }
    }
}
