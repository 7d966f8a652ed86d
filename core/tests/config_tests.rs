// tests/config_tests.rs

use cartsync::{SyncConfig, SyncError};
use serial_test::serial;
use std::env;

const VARS: [&str; 4] = [
  "CARTSYNC_CART_COLLECTION",
  "CARTSYNC_ORDER_COLLECTION",
  "CARTSYNC_DROP_SUPERSEDED_WRITES",
  "CARTSYNC_NOTICE_CAPACITY",
];

fn clear_vars() {
  for var in VARS {
    env::remove_var(var);
  }
}

#[test]
#[serial]
fn defaults_apply_when_nothing_is_set() {
  clear_vars();
  let config = SyncConfig::from_env().unwrap();
  assert_eq!(config, SyncConfig::default());
  assert_eq!(config.cart_collection, "carts");
  assert!(config.drop_superseded_writes);
}

#[test]
#[serial]
fn variables_override_defaults() {
  clear_vars();
  env::set_var("CARTSYNC_CART_COLLECTION", "baskets");
  env::set_var("CARTSYNC_ORDER_COLLECTION", "purchases");
  env::set_var("CARTSYNC_DROP_SUPERSEDED_WRITES", " false ");
  env::set_var("CARTSYNC_NOTICE_CAPACITY", "8");

  let config = SyncConfig::from_env().unwrap();
  clear_vars();

  assert_eq!(config.cart_collection, "baskets");
  assert_eq!(config.order_collection, "purchases");
  assert!(!config.drop_superseded_writes);
  assert_eq!(config.notice_capacity, 8);
}

#[test]
#[serial]
fn unparsable_values_are_config_errors() {
  clear_vars();
  env::set_var("CARTSYNC_NOTICE_CAPACITY", "lots");
  let err = SyncConfig::from_env().unwrap_err();
  clear_vars();
  assert!(matches!(err, SyncError::Config(ref m) if m.contains("CARTSYNC_NOTICE_CAPACITY")));

  env::set_var("CARTSYNC_DROP_SUPERSEDED_WRITES", "sometimes");
  let err = SyncConfig::from_env().unwrap_err();
  clear_vars();
  assert!(matches!(err, SyncError::Config(ref m) if m.contains("CARTSYNC_DROP_SUPERSEDED_WRITES")));
}

#[test]
#[serial]
fn collection_names_must_be_single_segments() {
  clear_vars();
  env::set_var("CARTSYNC_CART_COLLECTION", "users/carts");
  let err = SyncConfig::from_env().unwrap_err();
  clear_vars();
  assert!(matches!(err, SyncError::Config(_)));

  let blank = SyncConfig {
    order_collection: " ".to_string(),
    ..SyncConfig::default()
  };
  assert!(blank.validate().is_err());
}
