// demos/storefront/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use cartsync::SyncError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Session Required: {0}")]
  Session(String),

  #[error("Service Busy: {0}")]
  Busy(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Cart Sync Error: {source}")]
  Sync {
    #[from] // Allows conversion from cartsync::SyncError
    source: SyncError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String), // For miscellaneous errors
}

// Allow anyhow::Error to be converted into AppError for convenience in handlers
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<SyncError>() {
      Ok(sync_err) => AppError::Sync { source: sync_err },
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Session(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::Busy(m) => HttpResponse::ServiceUnavailable().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sync { source } => sync_error_response(source),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

fn sync_error_response(err: &SyncError) -> HttpResponse {
  match err {
    SyncError::NotSignedIn => HttpResponse::Unauthorized().json(json!({"error": "Sign in to continue."})),
    SyncError::CartNotReady => {
      HttpResponse::Conflict().json(json!({"error": "Your cart is still loading. Try again in a moment."}))
    }
    SyncError::EmptyCart => HttpResponse::BadRequest().json(json!({"error": "Your cart is empty."})),
    SyncError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
    SyncError::Store { source } => {
      tracing::error!(store_error = ?source, "Store error details");
      HttpResponse::ServiceUnavailable().json(json!({"error": "Storage is unavailable", "detail": source.to_string()}))
    }
    other => HttpResponse::InternalServerError()
      .json(json!({"error": "Cart processing error", "detail": other.to_string()})),
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
