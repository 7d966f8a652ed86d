// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use cartsync::{
  CartRecord, CartStore, CartSynchronizer, InMemoryDocumentStore, Order, OrderStore, PaymentMethod, Product,
  ShippingDetails, StoreError, SyncConfig, UserId,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---

pub fn product(id: &str, price: f64) -> Product {
  Product::new(id).with("name", format!("Product {}", id)).with("price", price)
}

pub fn cod_shipping() -> ShippingDetails {
  ShippingDetails {
    name: "Asha".to_string(),
    address: "12 Lake Road".to_string(),
    phone: "9800000000".to_string(),
    payment: PaymentMethod::Cod,
  }
}

pub fn memory_store() -> Arc<InMemoryDocumentStore> {
  Arc::new(InMemoryDocumentStore::new(&SyncConfig::default()))
}

pub fn synchronizer_over(store: Arc<InMemoryDocumentStore>) -> CartSynchronizer {
  CartSynchronizer::new(store.clone(), store, SyncConfig::default()).expect("synchronizer should build")
}

/// Seeds `carts/{uid}` directly, bypassing the synchronizer.
pub fn seed_cart(store: &InMemoryDocumentStore, uid: &str, items: serde_json::Value) {
  store.put_document(store.cart_path(&UserId::from(uid)), json!({ "items": items }));
}

/// Item ids and quantities of a stored cart, in stored order.
pub fn stored_quantities(store: &InMemoryDocumentStore, uid: &str) -> Option<Vec<(String, u32)>> {
  store.cart_of(&UserId::from(uid)).map(|record| {
    record
      .items
      .iter()
      .map(|item| (item.id.to_string(), item.quantity))
      .collect()
  })
}

// --- Gated store ---

/// A pass-through that can be held shut. While held, each call waits for a
/// permit; once closed, waiting and future calls fail with a backend error.
pub struct Gate {
  held: AtomicBool,
  permits: Semaphore,
}

impl Gate {
  fn new(held: bool) -> Self {
    Gate {
      held: AtomicBool::new(held),
      permits: Semaphore::new(0),
    }
  }

  pub fn hold(&self) {
    self.held.store(true, Ordering::SeqCst);
  }

  /// Lets `n` pending or future calls through, in arrival order.
  pub fn release(&self, n: usize) {
    self.permits.add_permits(n);
  }

  pub fn close(&self) {
    self.held.store(true, Ordering::SeqCst);
    self.permits.close();
  }

  async fn pass(&self) -> Result<(), StoreError> {
    if !self.held.load(Ordering::SeqCst) {
      return Ok(());
    }
    let permit = self.permits.acquire().await.map_err(|e| StoreError::Backend {
      source: anyhow::Error::new(e).context("gate closed"),
    })?;
    permit.forget();
    Ok(())
  }
}

/// Wraps the in-memory store so that cart reads block until released, and
/// records the order in which calls reach it. Writes and order appends can be
/// held the same way.
pub struct GatedStore {
  pub inner: InMemoryDocumentStore,
  pub reads: Gate,
  pub writes: Gate,
  pub appends: Gate,
  events: Mutex<Vec<String>>,
}

impl GatedStore {
  pub fn new() -> Self {
    GatedStore {
      inner: InMemoryDocumentStore::new(&SyncConfig::default()),
      reads: Gate::new(true),
      writes: Gate::new(false),
      appends: Gate::new(false),
      events: Mutex::new(Vec::new()),
    }
  }

  pub fn release_reads(&self, n: usize) {
    self.reads.release(n);
  }

  pub fn events(&self) -> Vec<String> {
    self.events.lock().clone()
  }

  pub fn writes(&self) -> usize {
    self.events.lock().iter().filter(|e| e.starts_with("write:")).count()
  }

  fn log(&self, event: String) {
    tracing::debug!(target: "gated_store", %event, "store event");
    self.events.lock().push(event);
  }
}

#[async_trait]
impl CartStore for GatedStore {
  async fn read(&self, user_id: &UserId) -> Result<Option<CartRecord>, StoreError> {
    self.log(format!("read:{}", user_id));
    self.reads.pass().await?;
    let result = self.inner.read(user_id).await;
    self.log(format!("read_done:{}", user_id));
    result
  }

  async fn write(&self, user_id: &UserId, record: &CartRecord) -> Result<(), StoreError> {
    self.log(format!("write:{}", user_id));
    self.writes.pass().await?;
    let result = self.inner.write(user_id, record).await;
    self.log(format!("write_done:{}", user_id));
    result
  }
}

#[async_trait]
impl OrderStore for GatedStore {
  async fn append(&self, user_id: &UserId, order: &Order) -> Result<(), StoreError> {
    self.log(format!("append:{}", user_id));
    self.appends.pass().await?;
    self.inner.append(user_id, order).await
  }

  async fn list(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
    self.inner.list(user_id).await
  }
}

/// Yields until `store` has seen at least `n` events.
pub async fn wait_for_events(store: &GatedStore, n: usize) {
  while store.events().len() < n {
    tokio::task::yield_now().await;
  }
}

/// Yields until `store` has logged `event`.
pub async fn wait_for_event(store: &GatedStore, event: &str) {
  while !store.events().iter().any(|e| e == event) {
    tokio::task::yield_now().await;
  }
}

pub fn gated_synchronizer(store: Arc<GatedStore>) -> CartSynchronizer {
  CartSynchronizer::new(store.clone(), store, SyncConfig::default()).expect("synchronizer should build")
}
