// cartsync/src/identity.rs

//! The identity gate: who is signed in, and whether that is known yet.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::{event, Level};

/// Authenticated user identifier; also the key of the user's cart document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self {
    UserId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(id: &str) -> Self {
    UserId::new(id)
  }
}

impl From<String> for UserId {
  fn from(id: String) -> Self {
    UserId(id)
  }
}

/// One notification from the identity provider.
///
/// While `is_resolving` is true (session bootstrap) `user_id` must not be
/// trusted either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub user_id: Option<UserId>,
  pub is_resolving: bool,
}

impl Identity {
  pub fn resolving() -> Self {
    Identity {
      user_id: None,
      is_resolving: true,
    }
  }

  pub fn signed_in(user_id: impl Into<UserId>) -> Self {
    Identity {
      user_id: Some(user_id.into()),
      is_resolving: false,
    }
  }

  pub fn signed_out() -> Self {
    Identity {
      user_id: None,
      is_resolving: false,
    }
  }
}

/// In-process identity source backed by a `watch` channel.
///
/// Starts out resolving. Subscribers always see the latest identity;
/// intermediate values may be coalesced.
#[derive(Debug)]
pub struct IdentityGate {
  tx: watch::Sender<Identity>,
}

impl IdentityGate {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(Identity::resolving());
    IdentityGate { tx }
  }

  pub fn sign_in(&self, user_id: impl Into<UserId>) {
    let identity = Identity::signed_in(user_id);
    event!(Level::INFO, user_id = ?identity.user_id, "Identity signed in.");
    self.tx.send_replace(identity);
  }

  pub fn sign_out(&self) {
    event!(Level::INFO, "Identity signed out.");
    self.tx.send_replace(Identity::signed_out());
  }

  pub fn current(&self) -> Identity {
    self.tx.borrow().clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<Identity> {
    self.tx.subscribe()
  }
}

impl Default for IdentityGate {
  fn default() -> Self {
    Self::new()
  }
}
