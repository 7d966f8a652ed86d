// demos/storefront/src/web/routes.rs

use crate::web::handlers::{cart_handlers, checkout_handlers, session_handlers};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// This function will be called in `main.rs` to configure services for the Actix App.
// Every route except /health expects an `X-Session-Id` header.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      .route("/health", web::get().to(health_check_handler))
      // Session Routes
      .service(
        web::scope("/session")
          .route("", web::get().to(session_handlers::session_status_handler))
          .route("", web::delete().to(session_handlers::end_session_handler))
          .route("/login", web::post().to(session_handlers::login_handler))
          .route("/logout", web::post().to(session_handlers::logout_handler))
          .route("/notices", web::get().to(session_handlers::notices_handler)),
      )
      // Cart Routes
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_item_handler))
          .route("/items/{product_id}", web::delete().to(cart_handlers::remove_item_handler))
          .route(
            "/items/{product_id}/increase",
            web::post().to(cart_handlers::increase_qty_handler),
          )
          .route(
            "/items/{product_id}/decrease",
            web::post().to(cart_handlers::decrease_qty_handler),
          ),
      )
      // Checkout Routes
      .service(
        web::scope("/checkout").route("", web::post().to(checkout_handlers::checkout_handler)),
      )
      .service(web::scope("/orders").route("", web::get().to(checkout_handlers::list_orders_handler))),
  );
}
