// cartsync/src/store/mod.rs

//! Contracts for the remote document store, plus an in-memory implementation.
//!
//! The synchronizer only needs point reads and full-document overwrites of a
//! user's cart, and append/list of that user's orders. No transactions,
//! queries or change streams.

pub mod memory;

use crate::cart::LineItem;
use crate::error::StoreError;
use crate::identity::UserId;
use crate::order::Order;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::InMemoryDocumentStore;

/// The remote cart document: `{ "items": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
  #[serde(default)]
  pub items: Vec<LineItem>,
}

#[async_trait]
pub trait CartStore: Send + Sync {
  /// Point lookup of the user's cart document. `Ok(None)` when the user has
  /// never had one.
  async fn read(&self, user_id: &UserId) -> Result<Option<CartRecord>, StoreError>;

  /// Overwrites the user's cart document. Idempotent.
  async fn write(&self, user_id: &UserId, record: &CartRecord) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn append(&self, user_id: &UserId, order: &Order) -> Result<(), StoreError>;

  /// The user's orders, newest first.
  async fn list(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError>;
}
