// cartsync/examples/flaky_store.rs

use cartsync::{Identity, InMemoryDocumentStore, CartSynchronizer, Product, SyncConfig, SyncError};
use std::sync::Arc;
use tracing::{info, warn};

// Shows how store failures surface: never as errors from the cart API, only
// as notices.
#[tokio::main]
async fn main() -> Result<(), SyncError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Flaky Store Example ---");

  let store = Arc::new(InMemoryDocumentStore::default());
  let sync = CartSynchronizer::new(store.clone(), store.clone(), SyncConfig::default())?;
  let mut notices = sync.subscribe_notices();

  // The saved cart cannot be read: the session starts empty.
  store.fail_reads(true);
  sync.on_identity(&Identity::signed_in("bob")).await?;
  store.fail_reads(false);

  // Writes fail for a while: the cart keeps working in memory.
  store.fail_writes(true);
  sync.add_item(Product::new("lamp").with("price", 40));
  sync.settle().await;
  store.fail_writes(false);

  // The next successful write carries the full cart, so nothing is lost.
  sync.add_item(Product::new("bulb").with("price", 3));
  sync.settle().await;

  while let Ok(notice) = notices.try_recv() {
    warn!(user_id = %notice.user_id(), toast = notice.message(), notice = ?notice, "Notice for the shopper.");
  }
  info!(
    stored = store.cart_of(&"bob".into()).map(|r| r.items.len()),
    writes_attempted = store.write_count(),
    "Done."
  );
  Ok(())
}
