// cartsync/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failure talking to a remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Store unavailable: {0}")]
  Unavailable(String),

  #[error("Permission denied for document '{path}'")]
  PermissionDenied { path: String },

  #[error("Document '{path}' could not be encoded or decoded. Source: {source}")]
  Codec {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("Store backend error. Source: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

#[derive(Debug, Error)]
pub enum SyncError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Remote store error: {source}")]
  Store {
    #[from]
    source: StoreError,
  },

  #[error("No signed-in user")]
  NotSignedIn,

  #[error("Cart has not finished loading from the remote store")]
  CartNotReady,

  #[error("Cannot place an order for an empty cart")]
  EmptyCart,

  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("No async runtime available: {0}")]
  Runtime(String),

  #[error("Error in flow handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal cartsync error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for SyncError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a StoreError that travelled through anyhow so callers can still match on it.
    match err.downcast::<StoreError>() {
      Ok(store_err) => SyncError::Store { source: store_err },
      Err(err) => SyncError::HandlerError { source: err },
    }
  }
}

pub type SyncResult<T, E = SyncError> = std::result::Result<T, E>;
