// cartsync/src/cart/mod.rs

//! The in-memory cart: line items and immutable cart snapshots.

pub mod item;
pub mod state;

pub use item::{LineItem, Product, ProductId};
pub use state::{Cart, CartMutation};
