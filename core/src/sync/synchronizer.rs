// cartsync/src/sync/synchronizer.rs

use crate::cart::{Cart, CartMutation, Product, ProductId};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::flow::{Flow, FlowOutcome};
use crate::identity::{Identity, UserId};
use crate::order::{Order, ShippingDetails};
use crate::shared::Shared;
use crate::store::{CartStore, OrderStore};
use crate::sync::checkout::{checkout_flow, CheckoutCtx};
use crate::sync::load::{cart_load_flow, CartLoadCtx};
use crate::sync::notice::SyncNotice;
use crate::sync::session::{LoadState, PendingWrite, SessionState};
use crate::sync::write_through::{write_through_flow, WriteThroughCtx};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Keeps one session's in-memory cart in step with the user's remote cart
/// document.
///
/// Mutations are synchronous and always succeed in memory. When the cart has
/// been fetched for the signed-in user, each change also spawns a
/// fire-and-forget write of the full snapshot onto the runtime the
/// synchronizer was created on. Store failures never reach the mutation
/// callers; they are logged and broadcast as `SyncNotice`s.
///
/// Clones share the same session.
#[derive(Clone)]
pub struct CartSynchronizer {
  carts: Arc<dyn CartStore>,
  orders: Arc<dyn OrderStore>,
  config: Arc<SyncConfig>,
  session: Shared<SessionState>,
  load_flow: Arc<Flow<CartLoadCtx, SyncError>>,
  write_flow: Arc<Flow<WriteThroughCtx, SyncError>>,
  checkout_flow: Arc<Flow<CheckoutCtx, SyncError>>,
  notices: broadcast::Sender<SyncNotice>,
  in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
  /// Held by a write-through for as long as it talks to the store.
  write_turn: Arc<AsyncMutex<()>>,
  runtime: Handle,
}

impl CartSynchronizer {
  /// Must be called from within a tokio runtime; write-throughs are spawned
  /// onto it.
  pub fn new(carts: Arc<dyn CartStore>, orders: Arc<dyn OrderStore>, config: SyncConfig) -> SyncResult<Self> {
    config.validate()?;
    let runtime = Handle::try_current().map_err(|e| SyncError::Runtime(e.to_string()))?;
    let (notices, _) = broadcast::channel(config.notice_capacity);

    Ok(CartSynchronizer {
      carts,
      orders,
      config: Arc::new(config),
      session: Shared::new(SessionState::default()),
      load_flow: Arc::new(cart_load_flow()),
      write_flow: Arc::new(write_through_flow()),
      checkout_flow: Arc::new(checkout_flow()),
      notices,
      in_flight: Arc::new(Mutex::new(Vec::new())),
      write_turn: Arc::new(AsyncMutex::new(())),
      runtime,
    })
  }

  // --- Observers ---

  pub fn cart(&self) -> Cart {
    self.session.read().cart.clone()
  }

  pub fn load_state(&self) -> LoadState {
    self.session.read().load_state
  }

  /// True while the signed-in user's cart is being fetched.
  pub fn is_loading(&self) -> bool {
    self.load_state() == LoadState::NotYetFetched
  }

  pub fn user(&self) -> Option<UserId> {
    self.session.read().user.clone()
  }

  pub fn config(&self) -> &SyncConfig {
    &self.config
  }

  pub fn subscribe_notices(&self) -> broadcast::Receiver<SyncNotice> {
    self.notices.subscribe()
  }

  // --- Identity ---

  /// Reacts to one identity notification.
  ///
  /// Signing in as a different user resets the session and fetches that
  /// user's cart before returning. A fetch whose identity has been replaced
  /// by the time it completes is discarded. Signing out empties the
  /// in-memory cart and leaves the remote record alone.
  ///
  /// The returned future may be dropped mid-fetch; the session then stays
  /// `NotYetFetched` until the next identity arrives, and the same user
  /// arriving again starts a fresh fetch.
  #[instrument(
    name = "CartSynchronizer::on_identity",
    skip_all,
    fields(user_id = ?identity.user_id, resolving = identity.is_resolving),
    err(Display)
  )]
  pub async fn on_identity(&self, identity: &Identity) -> SyncResult<()> {
    if identity.is_resolving {
      debug!("Identity still resolving; ignoring.");
      return Ok(());
    }

    let Some(user_id) = identity.user_id.clone() else {
      self.session.write().sign_out();
      info!("Signed out; in-memory cart cleared.");
      return Ok(());
    };

    let generation = {
      let mut session = self.session.write();
      if session.user.as_ref() == Some(&user_id) && session.load_state == LoadState::Fetched {
        debug!("Same user as the current session; nothing to do.");
        return Ok(());
      }
      session.begin_load(user_id.clone())
    };

    info!(%user_id, generation, "Signed in; loading cart.");
    let ctx = Shared::new(CartLoadCtx {
      user_id,
      generation,
      store: self.carts.clone(),
      session: self.session.clone(),
      notices: self.notices.clone(),
      fetched: Vec::new(),
      read_error: None,
    });
    match self.load_flow.run(ctx).await? {
      FlowOutcome::Completed => debug!("Cart load completed."),
      FlowOutcome::Stopped => debug!("Cart load superseded by a newer identity."),
    }
    Ok(())
  }

  /// Applies every identity the receiver yields until its sender is dropped.
  ///
  /// A new identity arriving while the previous one is still being applied
  /// (typically a cart fetch that has not returned) abandons that work and
  /// applies the new identity straight away, so a sign-out never waits on
  /// the store.
  pub async fn follow_identity(&self, mut identities: watch::Receiver<Identity>) {
    let mut identity = identities.borrow_and_update().clone();
    loop {
      let superseded_by = {
        let apply = self.on_identity(&identity);
        tokio::pin!(apply);
        loop {
          tokio::select! {
            result = &mut apply => {
              if let Err(err) = result {
                error!(error = %err, "Failed to apply identity change.");
              }
              break None;
            }
            changed = identities.changed() => {
              if changed.is_err() {
                if let Err(err) = (&mut apply).await {
                  error!(error = %err, "Failed to apply identity change.");
                }
                debug!("Identity source closed; no longer following.");
                return;
              }
              let latest = identities.borrow_and_update().clone();
              if latest != identity {
                debug!("Identity changed before the previous one was applied; switching.");
                break Some(latest);
              }
            }
          }
        }
      };

      identity = match superseded_by {
        Some(latest) => latest,
        None => {
          if identities.changed().await.is_err() {
            debug!("Identity source closed; no longer following.");
            return;
          }
          identities.borrow_and_update().clone()
        }
      };
    }
  }

  // --- Mutations ---

  pub fn add_item(&self, product: Product) -> Cart {
    self.mutate(CartMutation::Add(product))
  }

  pub fn remove_item(&self, id: &ProductId) -> Cart {
    self.mutate(CartMutation::Remove(id.clone()))
  }

  pub fn increase_qty(&self, id: &ProductId) -> Cart {
    self.mutate(CartMutation::Increase(id.clone()))
  }

  pub fn decrease_qty(&self, id: &ProductId) -> Cart {
    self.mutate(CartMutation::Decrease(id.clone()))
  }

  pub fn clear(&self) -> Cart {
    self.mutate(CartMutation::Clear)
  }

  /// Applies `mutation` in memory and, if the cart changed and write-through
  /// is enabled, spawns a write of the new snapshot.
  pub fn mutate(&self, mutation: CartMutation) -> Cart {
    let (cart, pending) = {
      let mut session = self.session.write();
      let next = session.cart.apply(&mutation);
      if next.same_snapshot(&session.cart) {
        debug!(mutation = mutation.name(), "Mutation left the cart unchanged.");
        return next;
      }
      let pending = session.commit(next.clone());
      if pending.is_none() {
        debug!(
          mutation = mutation.name(),
          load_state = ?session.load_state,
          "Cart changed in memory only; write-through suppressed until the cart is fetched."
        );
      }
      (next, pending)
    };

    if let Some(pending) = pending {
      debug!(mutation = mutation.name(), seq = pending.seq, "Issuing write-through.");
      self.spawn_write_through(pending);
    }
    cart
  }

  fn spawn_write_through(&self, pending: PendingWrite) {
    let user_id = pending.user_id.clone();
    let seq = pending.seq;
    let ctx = Shared::new(WriteThroughCtx {
      pending,
      store: self.carts.clone(),
      session: self.session.clone(),
      drop_superseded: self.config.drop_superseded_writes,
      turn: self.write_turn.clone(),
      holding_turn: None,
    });
    let flow = self.write_flow.clone();
    let notices = self.notices.clone();

    let handle = self.runtime.spawn(async move {
      match flow.run(ctx).await {
        Ok(FlowOutcome::Completed) => {}
        Ok(FlowOutcome::Stopped) => debug!(%user_id, seq, "Write-through dropped in favour of a newer one."),
        Err(err) => {
          error!(%user_id, seq, error = %err, "Cart write-through failed; the change is kept in memory only.");
          let _ = notices.send(SyncNotice::WriteFailed {
            user_id,
            reason: err.to_string(),
          });
        }
      }
    });

    let mut in_flight = self.in_flight.lock();
    in_flight.retain(|h| !h.is_finished());
    in_flight.push(handle);
  }

  /// Waits for every write-through issued so far, including ones issued
  /// while waiting.
  pub async fn settle(&self) {
    loop {
      let handles = std::mem::take(&mut *self.in_flight.lock());
      if handles.is_empty() {
        return;
      }
      for handle in handles {
        if let Err(join_err) = handle.await {
          warn!(error = %join_err, "Write-through task did not finish cleanly.");
        }
      }
    }
  }

  // --- Checkout ---

  /// Places an order for the current cart, then takes the ordered items out
  /// of the cart.
  ///
  /// Items added while the order was being saved stay in the cart. If the
  /// session changed hands in the meantime (sign-out, another user) the cart
  /// is left alone. On any failure the cart is left as it was.
  #[instrument(name = "CartSynchronizer::place_order", skip_all, err(Display))]
  pub async fn place_order(&self, shipping: ShippingDetails) -> SyncResult<Order> {
    let (user_id, cart, generation) = {
      let session = self.session.read();
      match (&session.user, session.load_state) {
        (None, _) => return Err(SyncError::NotSignedIn),
        (Some(_), state) if state != LoadState::Fetched => return Err(SyncError::CartNotReady),
        (Some(user_id), _) => (user_id.clone(), session.cart.clone(), session.generation),
      }
    };

    let ctx = Shared::new(CheckoutCtx {
      user_id,
      shipping,
      cart: cart.clone(),
      orders: self.orders.clone(),
      order: None,
    });
    if self.checkout_flow.run(ctx.clone()).await? == FlowOutcome::Stopped {
      return Err(SyncError::Internal("checkout stopped before the order was persisted".to_string()));
    }
    let order = ctx
      .write()
      .order
      .take()
      .ok_or_else(|| SyncError::Internal("checkout completed without an order".to_string()))?;

    self.remove_ordered(&cart, generation);
    Ok(order)
  }

  fn remove_ordered(&self, ordered: &Cart, generation: u64) {
    let pending = {
      let mut session = self.session.write();
      if session.generation != generation {
        warn!(
          order_generation = generation,
          current_generation = session.generation,
          "Session changed while the order was saved; leaving the current cart untouched."
        );
        return;
      }
      let remaining = if session.cart.same_snapshot(ordered) {
        Cart::default()
      } else {
        debug!("Cart changed during checkout; keeping items that were not ordered.");
        session.cart.without(ordered)
      };
      if remaining == session.cart {
        return;
      }
      session.commit(remaining)
    };
    if let Some(pending) = pending {
      self.spawn_write_through(pending);
    }
  }

  /// The signed-in user's past orders, newest first.
  pub async fn orders(&self) -> SyncResult<Vec<Order>> {
    let user_id = self.user().ok_or(SyncError::NotSignedIn)?;
    Ok(self.orders.list(&user_id).await?)
  }
}

impl std::fmt::Debug for CartSynchronizer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let session = self.session.read();
    f.debug_struct("CartSynchronizer")
      .field("user", &session.user)
      .field("load_state", &session.load_state)
      .field("items", &session.cart.len())
      .field("in_flight_writes", &self.in_flight.lock().len())
      .finish()
  }
}
