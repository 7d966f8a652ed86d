// cartsync/src/sync/write_through.rs

//! The `write_through` flow: persist one cart snapshot.

use crate::error::SyncError;
use crate::flow::{Flow, FlowControl, SkipCondition};
use crate::shared::Shared;
use crate::store::CartStore;
use crate::sync::session::{PendingWrite, SessionState};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, trace};

pub(crate) struct WriteThroughCtx {
  pub(crate) pending: PendingWrite,
  pub(crate) store: Arc<dyn CartStore>,
  pub(crate) session: Shared<SessionState>,
  pub(crate) drop_superseded: bool,
  /// One write talks to the store at a time per synchronizer.
  pub(crate) turn: Arc<AsyncMutex<()>>,
  pub(crate) holding_turn: Option<OwnedMutexGuard<()>>,
}

pub(crate) fn write_through_flow() -> Flow<WriteThroughCtx, SyncError> {
  let guard_disabled: SkipCondition<WriteThroughCtx> = Arc::new(|ctx| !ctx.read().drop_superseded);
  let mut flow = Flow::<WriteThroughCtx, SyncError>::new(
    "write_through",
    &[
      ("await_turn", false, None),
      ("drop_if_superseded", true, Some(guard_disabled)),
      ("write_remote", false, None),
    ],
  );

  flow.on_step("await_turn", |ctx: Shared<WriteThroughCtx>| async move {
    let turn = ctx.read().turn.clone();
    let held = turn.lock_owned().await;
    ctx.write().holding_turn = Some(held);
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  // Checked while holding the turn: a write that gets past here is the newest
  // issued so far, and any newer one waits until it has landed.
  flow.on_step("drop_if_superseded", |ctx: Shared<WriteThroughCtx>| async move {
    let guard = ctx.read();
    let superseded = guard
      .session
      .read()
      .is_superseded(&guard.pending.user_id, guard.pending.seq);
    if superseded {
      debug!(user_id = %guard.pending.user_id, seq = guard.pending.seq, "Write-through superseded; dropping.");
      return Ok(FlowControl::Stop);
    }
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow.on_step("write_remote", |ctx: Shared<WriteThroughCtx>| async move {
    let (store, pending) = {
      let guard = ctx.read();
      (guard.store.clone(), guard.pending.clone())
    };
    store.write(&pending.user_id, &pending.record).await?;
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow.after_step("write_remote", |ctx: Shared<WriteThroughCtx>| async move {
    let mut guard = ctx.write();
    guard.holding_turn = None;
    trace!(
      user_id = %guard.pending.user_id,
      seq = guard.pending.seq,
      items = guard.pending.record.items.len(),
      "Write-through acknowledged."
    );
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow
}
