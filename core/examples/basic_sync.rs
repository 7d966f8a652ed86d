// cartsync/examples/basic_sync.rs

use cartsync::{CartSynchronizer, IdentityGate, InMemoryDocumentStore, LoadState, Product, ProductId, SyncConfig, SyncError};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), SyncError> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Cart Sync Example ---");

  // 1. A store that already holds a cart for "alice"
  let config = SyncConfig::from_env()?;
  let store = Arc::new(InMemoryDocumentStore::new(&config));
  store.put_document(
    format!("{}/alice", config.cart_collection),
    json!({ "items": [{ "id": "mug", "quantity": 2, "price": 8.5 }] }),
  );

  // 2. One synchronizer per session, following an identity source
  let sync = CartSynchronizer::new(store.clone(), store.clone(), config)?;
  let gate = IdentityGate::new();
  let follower = tokio::spawn({
    let sync = sync.clone();
    let identities = gate.subscribe();
    async move { sync.follow_identity(identities).await }
  });

  // Guest changes stay in memory.
  sync.add_item(Product::new("sticker").with("price", 1.0));
  info!(items = sync.cart().len(), "Guest cart.");

  // 3. Sign in; the saved cart replaces the guest one once loaded
  gate.sign_in("alice");
  while sync.load_state() != LoadState::Fetched {
    tokio::task::yield_now().await;
  }
  info!(items = sync.cart().len(), total = sync.cart().total(), "Alice's saved cart loaded.");

  // 4. Every change is now written through
  sync.add_item(Product::new("teapot").with("name", "Teapot").with("price", 24.0));
  sync.increase_qty(&ProductId::from("mug"));
  sync.settle().await;
  info!(record = ?store.document("carts/alice"), "Stored cart after changes.");

  // 5. Sign out: memory is cleared, the stored cart stays
  gate.sign_out();
  while sync.load_state() != LoadState::NoUser {
    tokio::task::yield_now().await;
  }
  info!(
    in_memory = sync.cart().len(),
    stored = store.cart_of(&"alice".into()).map(|r| r.items.len()),
    "Signed out."
  );

  drop(gate);
  follower.await.map_err(|e| SyncError::Internal(e.to_string()))?;
  Ok(())
}
