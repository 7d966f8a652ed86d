// demos/storefront/src/web/handlers/mod.rs

// Declare handler modules
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod session_handlers;

use crate::errors::AppError;
use actix_web::{FromRequest, HttpRequest};
use cartsync::{Cart, CartSynchronizer};
use serde_json::{json, Value};
use tracing::warn;

pub const SESSION_HEADER: &str = "X-Session-Id";

/// Browser session id taken from the `X-Session-Id` header.
#[derive(Debug)]
pub struct SessionId(pub String);

impl FromRequest for SessionId {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let id = req
      .headers()
      .get(SESSION_HEADER)
      .and_then(|value| value.to_str().ok())
      .map(str::trim)
      .filter(|value| !value.is_empty());
    match id {
      Some(id) => futures_util::future::ready(Ok(SessionId(id.to_string()))),
      None => {
        warn!("SessionId extractor: missing or empty {} header.", SESSION_HEADER);
        futures_util::future::ready(Err(AppError::Session(format!(
          "A non-empty {} header is required.",
          SESSION_HEADER
        ))))
      }
    }
  }
}

/// JSON shape the storefront renders a cart from.
pub(crate) fn cart_view(sync: &CartSynchronizer, cart: &Cart) -> Value {
  json!({
    "userId": sync.user(),
    "loading": sync.is_loading(),
    "items": cart.items(),
    "itemCount": cart.item_count(),
    "total": cart.total(),
  })
}
