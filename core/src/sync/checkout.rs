// cartsync/src/sync/checkout.rs

//! The `checkout` flow: validate, price and persist an order from a cart
//! snapshot. Clearing the cart afterwards is left to the synchronizer, which
//! owns write-through.

use crate::cart::Cart;
use crate::error::SyncError;
use crate::flow::{Flow, FlowControl};
use crate::identity::UserId;
use crate::order::{Order, ShippingDetails};
use crate::shared::Shared;
use crate::store::OrderStore;
use std::sync::Arc;
use tracing::info;

pub(crate) struct CheckoutCtx {
  pub(crate) user_id: UserId,
  pub(crate) shipping: ShippingDetails,
  pub(crate) cart: Cart,
  pub(crate) orders: Arc<dyn OrderStore>,
  pub(crate) order: Option<Order>,
}

pub(crate) fn checkout_flow() -> Flow<CheckoutCtx, SyncError> {
  let mut flow = Flow::<CheckoutCtx, SyncError>::new(
    "checkout",
    &[
      ("validate_order", false, None),
      ("price_order", false, None),
      ("persist_order", false, None),
    ],
  );

  flow.on_step("validate_order", |ctx: Shared<CheckoutCtx>| async move {
    let guard = ctx.read();
    if guard.cart.is_empty() {
      return Err(SyncError::EmptyCart);
    }
    guard.shipping.validate()?;
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow.on_step("price_order", |ctx: Shared<CheckoutCtx>| async move {
    let mut guard = ctx.write();
    let order = Order::new(guard.shipping.clone(), guard.cart.items().to_vec(), guard.cart.total());
    info!(user_id = %guard.user_id, order_id = %order.id, total = order.total, items = order.items.len(), "Order priced.");
    guard.order = Some(order);
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow.on_step("persist_order", |ctx: Shared<CheckoutCtx>| async move {
    let (orders, user_id, order) = {
      let guard = ctx.read();
      let order = guard
        .order
        .clone()
        .ok_or_else(|| SyncError::Internal("persist_order ran before price_order".to_string()))?;
      (guard.orders.clone(), guard.user_id.clone(), order)
    };
    orders.append(&user_id, &order).await?;
    info!(%user_id, order_id = %order.id, "Order persisted.");
    Ok::<_, SyncError>(FlowControl::Continue)
  });

  flow
}
