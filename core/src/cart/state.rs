// cartsync/src/cart/state.rs

//! Immutable cart snapshots and the pure mutations between them.

use crate::cart::item::{LineItem, Product, ProductId};
use crate::store::CartRecord;
use std::sync::Arc;
use tracing::warn;

/// One change a user can make to their cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartMutation {
  Add(Product),
  Remove(ProductId),
  Increase(ProductId),
  Decrease(ProductId),
  Clear,
}

impl CartMutation {
  pub fn name(&self) -> &'static str {
    match self {
      CartMutation::Add(_) => "add_item",
      CartMutation::Remove(_) => "remove_item",
      CartMutation::Increase(_) => "increase_qty",
      CartMutation::Decrease(_) => "decrease_qty",
      CartMutation::Clear => "clear",
    }
  }
}

/// An immutable snapshot of a cart's line items, in insertion order.
///
/// Mutations never touch `self`; they return a new snapshot. A mutation that
/// changes nothing (unknown id, clearing an empty cart) returns a clone that
/// shares storage with `self`, so `same_snapshot` tells "changed" from
/// "unchanged" without comparing items.
#[derive(Debug, Clone, Default)]
pub struct Cart {
  items: Arc<Vec<LineItem>>,
}

impl PartialEq for Cart {
  fn eq(&self, other: &Self) -> bool {
    self.same_snapshot(other) || self.items == other.items
  }
}

impl Cart {
  fn from_vec(items: Vec<LineItem>) -> Self {
    Cart { items: Arc::new(items) }
  }

  /// Builds a cart from items read back from a remote record.
  ///
  /// The record is not trusted to uphold the cart's invariants: zero-quantity
  /// items are dropped and repeated ids are merged into the first occurrence.
  pub fn from_items(items: Vec<LineItem>) -> Self {
    let mut normalized: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
      if item.quantity == 0 {
        warn!(product_id = %item.id, "Dropping zero-quantity line item from remote record.");
        continue;
      }
      match normalized.iter_mut().find(|existing| existing.id == item.id) {
        Some(existing) => {
          warn!(product_id = %item.id, "Merging duplicate line item from remote record.");
          existing.quantity = existing.quantity.saturating_add(item.quantity);
        }
        None => normalized.push(item),
      }
    }
    Cart::from_vec(normalized)
  }

  pub fn items(&self) -> &[LineItem] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
    self.items.iter().find(|item| &item.id == id)
  }

  pub fn contains(&self, id: &ProductId) -> bool {
    self.get(id).is_some()
  }

  /// Sum of quantities, e.g. for a cart badge.
  pub fn item_count(&self) -> u64 {
    self.items.iter().map(|item| u64::from(item.quantity)).sum()
  }

  pub fn total(&self) -> f64 {
    self.items.iter().map(LineItem::line_total).sum()
  }

  pub fn same_snapshot(&self, other: &Cart) -> bool {
    Arc::ptr_eq(&self.items, &other.items)
  }

  pub fn to_record(&self) -> CartRecord {
    CartRecord {
      items: self.items.as_ref().clone(),
    }
  }

  pub fn apply(&self, mutation: &CartMutation) -> Cart {
    match mutation {
      CartMutation::Add(product) => self.add_item(product),
      CartMutation::Remove(id) => self.remove_item(id),
      CartMutation::Increase(id) => self.increase_qty(id),
      CartMutation::Decrease(id) => self.decrease_qty(id),
      CartMutation::Clear => self.clear(),
    }
  }

  /// Increments the quantity of `product.id` if present, otherwise appends it
  /// with quantity 1.
  pub fn add_item(&self, product: &Product) -> Cart {
    match self.position(&product.id) {
      Some(pos) => self.edit(|items| {
        items[pos].quantity = items[pos].quantity.saturating_add(1);
      }),
      None => {
        let mut items = self.items.as_ref().clone();
        items.push(product.to_line_item());
        Cart::from_vec(items)
      }
    }
  }

  pub fn remove_item(&self, id: &ProductId) -> Cart {
    match self.position(id) {
      Some(pos) => self.edit(|items| {
        items.remove(pos);
      }),
      None => self.clone(),
    }
  }

  pub fn increase_qty(&self, id: &ProductId) -> Cart {
    match self.position(id) {
      Some(pos) => self.edit(|items| {
        items[pos].quantity = items[pos].quantity.saturating_add(1);
      }),
      None => self.clone(),
    }
  }

  /// Decrements the quantity of `id`; an item that would reach zero is removed.
  pub fn decrease_qty(&self, id: &ProductId) -> Cart {
    match self.position(id) {
      Some(pos) => self.edit(|items| {
        if items[pos].quantity <= 1 {
          items.remove(pos);
        } else {
          items[pos].quantity -= 1;
        }
      }),
      None => self.clone(),
    }
  }

  pub fn clear(&self) -> Cart {
    if self.is_empty() {
      self.clone()
    } else {
      Cart::default()
    }
  }

  /// What is left of `self` once the quantities in `ordered` are taken out.
  /// Items that drop to zero are removed; the rest keep their position.
  pub fn without(&self, ordered: &Cart) -> Cart {
    if ordered.is_empty() {
      return self.clone();
    }
    let remaining = self
      .items
      .iter()
      .filter_map(|item| {
        let taken = ordered.get(&item.id).map_or(0, |o| o.quantity);
        let left = item.quantity.saturating_sub(taken);
        (left > 0).then(|| LineItem {
          quantity: left,
          ..item.clone()
        })
      })
      .collect();
    Cart::from_vec(remaining)
  }

  fn position(&self, id: &ProductId) -> Option<usize> {
    self.items.iter().position(|item| &item.id == id)
  }

  fn edit(&self, f: impl FnOnce(&mut Vec<LineItem>)) -> Cart {
    let mut items = self.items.as_ref().clone();
    f(&mut items);
    Cart::from_vec(items)
  }
}
