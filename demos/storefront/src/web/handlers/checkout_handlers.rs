// demos/storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use cartsync::ShippingDetails;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::SessionId;
use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::checkout", skip(app_state, shipping), fields(session_id = %session_id.0))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
  shipping: web::Json<ShippingDetails>,
) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  match session.sync.place_order(shipping.into_inner()).await {
    Ok(order) => {
      info!(order_id = %order.id, total = order.total, "Order placed.");
      Ok(HttpResponse::Created().json(json!({
          "message": "Order placed successfully.",
          "order": order
      })))
    }
    Err(sync_err) => {
      warn!(error = %sync_err, "Checkout failed; cart left unchanged.");
      Err(sync_err.into())
    }
  }
}

pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let orders = session.sync.orders().await?;
  Ok(HttpResponse::Ok().json(orders))
}
