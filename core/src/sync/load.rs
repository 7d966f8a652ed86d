// cartsync/src/sync/load.rs

//! The `cart_load` flow: read the signed-in user's cart and install it.

use crate::cart::{Cart, LineItem};
use crate::error::SyncError;
use crate::flow::{Flow, FlowControl};
use crate::identity::UserId;
use crate::shared::Shared;
use crate::store::CartStore;
use crate::sync::notice::SyncNotice;
use crate::sync::session::{LoadState, SessionState};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

pub(crate) struct CartLoadCtx {
  pub(crate) user_id: UserId,
  pub(crate) generation: u64,
  pub(crate) store: Arc<dyn CartStore>,
  pub(crate) session: Shared<SessionState>,
  pub(crate) notices: broadcast::Sender<SyncNotice>,
  pub(crate) fetched: Vec<LineItem>,
  pub(crate) read_error: Option<String>,
}

pub(crate) fn cart_load_flow() -> Flow<CartLoadCtx, SyncError> {
  let mut flow = Flow::<CartLoadCtx, SyncError>::new(
    "cart_load",
    &[("read_remote", false, None), ("install_cart", false, None)],
  );

  // A failed read is not an error here: the session falls back to an empty
  // cart so shopping stays possible.
  flow.on_step("read_remote", |ctx: Shared<CartLoadCtx>| async move {
    let (store, user_id) = {
      let guard = ctx.read();
      (guard.store.clone(), guard.user_id.clone())
    };

    match store.read(&user_id).await {
      Ok(Some(record)) => {
        info!(%user_id, items = record.items.len(), "Remote cart found.");
        ctx.write().fetched = record.items;
      }
      Ok(None) => {
        info!(%user_id, "No remote cart yet; starting empty.");
      }
      Err(err) => {
        error!(%user_id, error = %err, "Reading remote cart failed; treating it as empty.");
        ctx.write().read_error = Some(err.to_string());
      }
    }
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow.on_step("install_cart", |ctx: Shared<CartLoadCtx>| async move {
    let (fetched, generation, session) = {
      let mut guard = ctx.write();
      (std::mem::take(&mut guard.fetched), guard.generation, guard.session.clone())
    };

    let mut state = session.write();
    if state.generation != generation {
      debug!(
        load_generation = generation,
        current_generation = state.generation,
        "Identity changed while the cart was loading; discarding the result."
      );
      return Ok(FlowControl::Stop);
    }
    state.cart = Cart::from_items(fetched);
    state.load_state = LoadState::Fetched;
    debug!(items = state.cart.len(), "Cart installed; write-through enabled.");
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow.after_step("install_cart", |ctx: Shared<CartLoadCtx>| async move {
    let guard = ctx.read();
    if let Some(reason) = &guard.read_error {
      let _ = guard.notices.send(SyncNotice::ReadFailed {
        user_id: guard.user_id.clone(),
        reason: reason.clone(),
      });
    }
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow
}
