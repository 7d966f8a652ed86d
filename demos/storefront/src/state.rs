// demos/storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use cartsync::{CartSynchronizer, IdentityGate, InMemoryDocumentStore, SyncNotice};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// One browser session: its own identity source and cart synchronizer.
pub struct ShopperSession {
  pub gate: IdentityGate,
  pub sync: CartSynchronizer,
  notices: Mutex<broadcast::Receiver<SyncNotice>>,
  follower: JoinHandle<()>,
  last_seen: Mutex<Instant>,
}

impl ShopperSession {
  /// Notices raised since the last call, oldest first.
  pub fn drain_notices(&self) -> Vec<SyncNotice> {
    let mut receiver = self.notices.lock();
    let mut drained = Vec::new();
    loop {
      match receiver.try_recv() {
        Ok(notice) => drained.push(notice),
        Err(TryRecvError::Lagged(missed)) => warn!(missed, "Session fell behind on sync notices."),
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
      }
    }
    drained
  }
}

impl Drop for ShopperSession {
  fn drop(&mut self) {
    self.follower.abort();
  }
}

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>, // Share loaded config
  /// Stands in for the hosted document database; shared by every session.
  pub store: Arc<InMemoryDocumentStore>,
  sessions: Arc<Mutex<HashMap<String, Arc<ShopperSession>>>>,
}

impl AppState {
  pub fn new(config: Arc<AppConfig>) -> Self {
    let store = Arc::new(InMemoryDocumentStore::new(&config.sync));
    AppState {
      config,
      store,
      sessions: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Returns the session for `session_id`, starting one if needed.
  ///
  /// A new session starts with a resolving identity and a synchronizer that
  /// follows it. When `max_sessions` are live, sessions idle for at least
  /// `session_idle` are dropped to make room; if none are, the request is
  /// turned away.
  pub fn session(&self, session_id: &str) -> Result<Arc<ShopperSession>> {
    let mut sessions = self.sessions.lock();
    if let Some(existing) = sessions.get(session_id) {
      *existing.last_seen.lock() = Instant::now();
      return Ok(existing.clone());
    }

    if sessions.len() >= self.config.max_sessions {
      let idle = self.config.session_idle;
      let before = sessions.len();
      sessions.retain(|_, session| session.last_seen.lock().elapsed() < idle);
      info!(evicted = before - sessions.len(), "Reclaimed idle shopper sessions.");
      if sessions.len() >= self.config.max_sessions {
        warn!(active_sessions = sessions.len(), "Session table full; refusing a new session.");
        return Err(AppError::Busy("Too many active sessions. Try again later.".to_string()));
      }
    }

    let sync = CartSynchronizer::new(self.store.clone(), self.store.clone(), self.config.sync.clone())?;
    let gate = IdentityGate::new();
    let follower = tokio::spawn({
      let sync = sync.clone();
      let identities = gate.subscribe();
      async move { sync.follow_identity(identities).await }
    });
    let notices = Mutex::new(sync.subscribe_notices());

    let session = Arc::new(ShopperSession {
      gate,
      sync,
      notices,
      follower,
      last_seen: Mutex::new(Instant::now()),
    });
    sessions.insert(session_id.to_string(), session.clone());
    info!(%session_id, active_sessions = sessions.len(), "Shopper session started.");
    Ok(session)
  }

  pub fn end_session(&self, session_id: &str) -> bool {
    self.sessions.lock().remove(session_id).is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cartsync::SyncConfig;
  use std::time::Duration;

  fn state_with(max_sessions: usize, session_idle: Duration) -> AppState {
    AppState::new(Arc::new(AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      sync: SyncConfig::default(),
      max_sessions,
      session_idle,
    }))
  }

  #[tokio::test]
  async fn full_table_of_active_sessions_refuses_new_ones() {
    let state = state_with(2, Duration::from_secs(3600));
    let first = state.session("a").unwrap();
    state.session("b").unwrap();

    assert!(matches!(state.session("c"), Err(AppError::Busy(_))));
    assert!(Arc::ptr_eq(&first, &state.session("a").unwrap()));
    assert_eq!(state.sessions.lock().len(), 2);

    assert!(state.end_session("b"));
    state.session("c").unwrap();
  }

  #[tokio::test]
  async fn idle_sessions_are_reclaimed_to_make_room() {
    let state = state_with(2, Duration::ZERO);
    state.session("a").unwrap();
    state.session("b").unwrap();

    state.session("c").unwrap();
    let sessions = state.sessions.lock();
    assert_eq!(sessions.len(), 1);
    assert!(sessions.contains_key("c"));
  }
}
