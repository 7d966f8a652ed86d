// cartsync/src/sync/notice.rs

use crate::identity::UserId;

/// Non-blocking problems worth telling the shopper about (a toast, not an
/// error screen). The cart keeps working in memory either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
  /// The saved cart could not be loaded; the session started with an empty cart.
  ReadFailed { user_id: UserId, reason: String },
  /// A change could not be saved. It stays in this session only.
  WriteFailed { user_id: UserId, reason: String },
}

impl SyncNotice {
  pub fn user_id(&self) -> &UserId {
    match self {
      SyncNotice::ReadFailed { user_id, .. } | SyncNotice::WriteFailed { user_id, .. } => user_id,
    }
  }

  /// Short text suitable for a toast.
  pub fn message(&self) -> &'static str {
    match self {
      SyncNotice::ReadFailed { .. } => "We couldn't load your saved cart. Items you add now may replace it.",
      SyncNotice::WriteFailed { .. } => "We couldn't save your cart. Changes are kept on this device for now.",
    }
  }
}
