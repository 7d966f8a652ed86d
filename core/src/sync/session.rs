// cartsync/src/sync/session.rs

use crate::cart::Cart;
use crate::identity::UserId;
use crate::store::CartRecord;

/// Whether local mutations may be written through to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
  /// Nobody is signed in. Mutations stay in memory.
  #[default]
  NoUser,
  /// A user is signed in and their cart is being read. Mutations stay in
  /// memory and are replaced by the fetched cart.
  NotYetFetched,
  /// The initial read finished (found, absent or failed). Write-through is on.
  Fetched,
}

/// A snapshot queued for write-through.
#[derive(Debug, Clone)]
pub(crate) struct PendingWrite {
  pub(crate) user_id: UserId,
  pub(crate) record: CartRecord,
  pub(crate) seq: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
  pub(crate) user: Option<UserId>,
  pub(crate) cart: Cart,
  pub(crate) load_state: LoadState,
  /// Bumped on every sign-in and sign-out; a cart load only installs its
  /// result if the generation it started under is still current.
  pub(crate) generation: u64,
  next_write_seq: u64,
  /// Latest write-through issued, and for whom.
  last_issued: Option<(UserId, u64)>,
}

impl SessionState {
  /// Replaces the cart and, when write-through is allowed, returns the write
  /// to issue for it.
  pub(crate) fn commit(&mut self, cart: Cart) -> Option<PendingWrite> {
    self.cart = cart;
    let user_id = match (&self.user, self.load_state) {
      (Some(user_id), LoadState::Fetched) => user_id.clone(),
      _ => return None,
    };
    self.next_write_seq += 1;
    let seq = self.next_write_seq;
    self.last_issued = Some((user_id.clone(), seq));
    Some(PendingWrite {
      user_id,
      record: self.cart.to_record(),
      seq,
    })
  }

  /// True when a newer write for the same user was issued after `seq`.
  /// Writes for a user who has since signed out are never superseded by
  /// another user's writes: they still complete against their own key.
  pub(crate) fn is_superseded(&self, user_id: &UserId, seq: u64) -> bool {
    matches!(&self.last_issued, Some((latest_user, latest_seq)) if latest_user == user_id && *latest_seq > seq)
  }

  pub(crate) fn begin_load(&mut self, user_id: UserId) -> u64 {
    self.generation += 1;
    self.user = Some(user_id);
    self.cart = Cart::default();
    self.load_state = LoadState::NotYetFetched;
    self.generation
  }

  pub(crate) fn sign_out(&mut self) {
    self.generation += 1;
    self.user = None;
    self.cart = Cart::default();
    self.load_state = LoadState::NoUser;
  }
}
