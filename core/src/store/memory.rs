// cartsync/src/store/memory.rs

use crate::config::SyncConfig;
use crate::error::StoreError;
use crate::identity::UserId;
use crate::order::Order;
use crate::store::{CartRecord, CartStore, OrderStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{event, instrument, Level};

/// A path-keyed JSON document store held in memory.
///
/// Documents are stored as `serde_json::Value`, so every write and read goes
/// through the same encode/decode a networked document database would. Reads
/// and writes can be made to fail on demand, and both are counted. Access for
/// individual users can be revoked, mirroring per-user security rules.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
  cart_collection: String,
  order_collection: String,
  documents: Mutex<BTreeMap<String, Value>>,
  fail_reads: AtomicBool,
  fail_writes: AtomicBool,
  denied: Mutex<BTreeSet<UserId>>,
  reads: AtomicUsize,
  writes: AtomicUsize,
}

impl InMemoryDocumentStore {
  pub fn new(config: &SyncConfig) -> Self {
    InMemoryDocumentStore {
      cart_collection: config.cart_collection.clone(),
      order_collection: config.order_collection.clone(),
      documents: Mutex::new(BTreeMap::new()),
      fail_reads: AtomicBool::new(false),
      fail_writes: AtomicBool::new(false),
      denied: Mutex::new(BTreeSet::new()),
      reads: AtomicUsize::new(0),
      writes: AtomicUsize::new(0),
    }
  }

  pub fn cart_path(&self, user_id: &UserId) -> String {
    format!("{}/{}", self.cart_collection, user_id)
  }

  fn orders_prefix(&self, user_id: &UserId) -> String {
    format!("users/{}/{}/", user_id, self.order_collection)
  }

  /// Raw document at `path`, if any.
  pub fn document(&self, path: &str) -> Option<Value> {
    self.documents.lock().get(path).cloned()
  }

  /// Stores a raw document, bypassing the typed API and the counters.
  pub fn put_document(&self, path: impl Into<String>, document: Value) {
    self.documents.lock().insert(path.into(), document);
  }

  /// Decoded cart document of `user_id`, bypassing fault injection and counters.
  pub fn cart_of(&self, user_id: &UserId) -> Option<CartRecord> {
    let value = self.document(&self.cart_path(user_id))?;
    serde_json::from_value(value).ok()
  }

  pub fn fail_reads(&self, fail: bool) {
    self.fail_reads.store(fail, Ordering::SeqCst);
  }

  pub fn fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  /// Every read and write touching `user_id`'s documents fails with
  /// `PermissionDenied` until `allow_access` is called.
  pub fn deny_access(&self, user_id: &UserId) {
    self.denied.lock().insert(user_id.clone());
  }

  pub fn allow_access(&self, user_id: &UserId) {
    self.denied.lock().remove(user_id);
  }

  pub fn read_count(&self) -> usize {
    self.reads.load(Ordering::SeqCst)
  }

  pub fn write_count(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  fn check_access(&self, user_id: &UserId, path: &str) -> Result<(), StoreError> {
    if self.denied.lock().contains(user_id) {
      return Err(StoreError::PermissionDenied { path: path.to_string() });
    }
    Ok(())
  }

  fn check_reads(&self, user_id: &UserId, path: &str) -> Result<(), StoreError> {
    self.reads.fetch_add(1, Ordering::SeqCst);
    self.check_access(user_id, path)?;
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable(format!("injected read failure for '{}'", path)));
    }
    Ok(())
  }

  fn check_writes(&self, user_id: &UserId, path: &str) -> Result<(), StoreError> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    self.check_access(user_id, path)?;
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable(format!("injected write failure for '{}'", path)));
    }
    Ok(())
  }

  fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
    let Some(value) = self.document(path) else {
      return Ok(None);
    };
    serde_json::from_value(value)
      .map(Some)
      .map_err(|source| StoreError::Codec {
        path: path.to_string(),
        source,
      })
  }

  fn put_typed<T: Serialize>(&self, path: String, document: &T) -> Result<(), StoreError> {
    let value = serde_json::to_value(document).map_err(|source| StoreError::Codec {
      path: path.clone(),
      source,
    })?;
    self.documents.lock().insert(path, value);
    Ok(())
  }
}

impl Default for InMemoryDocumentStore {
  fn default() -> Self {
    Self::new(&SyncConfig::default())
  }
}

#[async_trait]
impl CartStore for InMemoryDocumentStore {
  #[instrument(name = "InMemoryDocumentStore::read", skip_all, fields(%user_id), err(Display))]
  async fn read(&self, user_id: &UserId) -> Result<Option<CartRecord>, StoreError> {
    let path = self.cart_path(user_id);
    self.check_reads(user_id, &path)?;
    let record = self.get_typed::<CartRecord>(&path)?;
    event!(Level::TRACE, %path, found = record.is_some(), "Cart document read.");
    Ok(record)
  }

  #[instrument(name = "InMemoryDocumentStore::write", skip_all, fields(%user_id, items = record.items.len()), err(Display))]
  async fn write(&self, user_id: &UserId, record: &CartRecord) -> Result<(), StoreError> {
    let path = self.cart_path(user_id);
    self.check_writes(user_id, &path)?;
    self.put_typed(path, record)
  }
}

#[async_trait]
impl OrderStore for InMemoryDocumentStore {
  #[instrument(name = "InMemoryDocumentStore::append", skip_all, fields(%user_id, order_id = %order.id), err(Display))]
  async fn append(&self, user_id: &UserId, order: &Order) -> Result<(), StoreError> {
    let path = format!("{}{}", self.orders_prefix(user_id), order.id);
    self.check_writes(user_id, &path)?;
    self.put_typed(path, order)
  }

  async fn list(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
    let prefix = self.orders_prefix(user_id);
    self.check_reads(user_id, &prefix)?;
    let raw: Vec<(String, Value)> = {
      let documents = self.documents.lock();
      documents
        .range(prefix.clone()..)
        .take_while(|(path, _)| path.starts_with(&prefix))
        .map(|(path, value)| (path.clone(), value.clone()))
        .collect()
    };
    let mut orders = raw
      .into_iter()
      .map(|(path, value)| serde_json::from_value::<Order>(value).map_err(|source| StoreError::Codec { path, source }))
      .collect::<Result<Vec<_>, _>>()?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }
}
