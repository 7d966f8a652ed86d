// cartsync/src/config.rs

use crate::error::{SyncError, SyncResult};
use dotenvy::dotenv;
use std::env;

/// Tunables for a `CartSynchronizer` and the bundled document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
  /// Collection holding one cart document per user: `{cart_collection}/{uid}`.
  pub cart_collection: String,
  /// Per-user order sub-collection: `users/{uid}/{order_collection}/{order_id}`.
  pub order_collection: String,
  /// Drop a write-through that has not started yet when a newer one for the
  /// same user was issued after it.
  pub drop_superseded_writes: bool,
  /// Buffer of the `SyncNotice` broadcast channel. Must be non-zero.
  pub notice_capacity: usize,
}

impl Default for SyncConfig {
  fn default() -> Self {
    SyncConfig {
      cart_collection: "carts".to_string(),
      order_collection: "orders".to_string(),
      drop_superseded_writes: true,
      notice_capacity: 64,
    }
  }
}

impl SyncConfig {
  /// Reads `CARTSYNC_CART_COLLECTION`, `CARTSYNC_ORDER_COLLECTION`,
  /// `CARTSYNC_DROP_SUPERSEDED_WRITES` and `CARTSYNC_NOTICE_CAPACITY`,
  /// falling back to the defaults for unset variables.
  pub fn from_env() -> SyncResult<Self> {
    dotenv().ok(); // Load .env file if present

    let defaults = SyncConfig::default();
    let get_env = |var_name: &str| env::var(var_name).ok();

    let cart_collection = get_env("CARTSYNC_CART_COLLECTION").unwrap_or(defaults.cart_collection);
    let order_collection = get_env("CARTSYNC_ORDER_COLLECTION").unwrap_or(defaults.order_collection);
    let drop_superseded_writes = match get_env("CARTSYNC_DROP_SUPERSEDED_WRITES") {
      Some(raw) => raw
        .trim()
        .parse::<bool>()
        .map_err(|e| SyncError::Config(format!("Invalid CARTSYNC_DROP_SUPERSEDED_WRITES '{}': {}", raw, e)))?,
      None => defaults.drop_superseded_writes,
    };
    let notice_capacity = match get_env("CARTSYNC_NOTICE_CAPACITY") {
      Some(raw) => raw
        .trim()
        .parse::<usize>()
        .map_err(|e| SyncError::Config(format!("Invalid CARTSYNC_NOTICE_CAPACITY '{}': {}", raw, e)))?,
      None => defaults.notice_capacity,
    };

    let config = SyncConfig {
      cart_collection,
      order_collection,
      drop_superseded_writes,
      notice_capacity,
    };
    config.validate()?;
    tracing::debug!(config = ?config, "cartsync configuration loaded.");
    Ok(config)
  }

  pub fn validate(&self) -> SyncResult<()> {
    for (name, value) in [
      ("cart_collection", &self.cart_collection),
      ("order_collection", &self.order_collection),
    ] {
      if value.trim().is_empty() || value.contains('/') {
        return Err(SyncError::Config(format!(
          "{} must be a non-empty single path segment, got '{}'",
          name, value
        )));
      }
    }
    if self.notice_capacity == 0 {
      return Err(SyncError::Config("notice_capacity must be greater than zero".to_string()));
    }
    Ok(())
  }
}
