// demos/storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use cartsync::{Product, ProductId};
use tracing::{info, instrument};

use super::{cart_view, SessionId};
use crate::errors::AppError;
use crate::state::AppState;

pub async fn get_cart_handler(app_state: web::Data<AppState>, session_id: SessionId) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let cart = session.sync.cart();
  Ok(HttpResponse::Ok().json(cart_view(&session.sync, &cart)))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, product),
    fields(session_id = %session_id.0, product_id = %product.id)
)]
pub async fn add_item_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
  product: web::Json<Product>,
) -> Result<HttpResponse, AppError> {
  if product.id.as_str().trim().is_empty() {
    return Err(AppError::Validation("Product id must not be empty.".to_string()));
  }
  let session = app_state.session(&session_id.0)?;
  let cart = session.sync.add_item(product.into_inner());
  info!(items = cart.len(), "Item added to cart.");
  Ok(HttpResponse::Ok().json(cart_view(&session.sync, &cart)))
}

pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let cart = session.sync.remove_item(&ProductId::from(path.into_inner()));
  Ok(HttpResponse::Ok().json(cart_view(&session.sync, &cart)))
}

pub async fn increase_qty_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let cart = session.sync.increase_qty(&ProductId::from(path.into_inner()));
  Ok(HttpResponse::Ok().json(cart_view(&session.sync, &cart)))
}

pub async fn decrease_qty_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let cart = session.sync.decrease_qty(&ProductId::from(path.into_inner()));
  Ok(HttpResponse::Ok().json(cart_view(&session.sync, &cart)))
}

pub async fn clear_cart_handler(app_state: web::Data<AppState>, session_id: SessionId) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let cart = session.sync.clear();
  Ok(HttpResponse::Ok().json(cart_view(&session.sync, &cart)))
}
