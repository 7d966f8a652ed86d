// demos/storefront/src/config.rs

use crate::errors::{AppError, Result}; // Use AppError specific Result
use cartsync::SyncConfig;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)] // Clone is useful if parts of config are passed around
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Settings for every session's cart synchronizer and the shared store.
  pub sync: SyncConfig,
  /// Upper bound on live shopper sessions.
  pub max_sessions: usize,
  /// How long a session may go unused before it can be reclaimed to make room.
  pub session_idle: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let max_sessions = get_env("MAX_SESSIONS")
      .unwrap_or_else(|_| "1000".to_string())
      .parse::<usize>()
      .map_err(|e| AppError::Config(format!("Invalid MAX_SESSIONS: {}", e)))?;
    if max_sessions == 0 {
      return Err(AppError::Config("MAX_SESSIONS must be at least 1".to_string()));
    }
    let session_idle = get_env("SESSION_IDLE_SECS")
      .unwrap_or_else(|_| "1800".to_string())
      .parse::<u64>()
      .map(Duration::from_secs)
      .map_err(|e| AppError::Config(format!("Invalid SESSION_IDLE_SECS: {}", e)))?;
    let sync = SyncConfig::from_env()?;

    tracing::info!(
      %server_host,
      server_port,
      max_sessions,
      session_idle_secs = session_idle.as_secs(),
      cart_collection = %sync.cart_collection,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      sync,
      max_sessions,
      session_idle,
    })
  }
}
