// demos/storefront/src/web/handlers/session_handlers.rs

use actix_web::{web, HttpResponse};
use cartsync::SyncNotice;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::SessionId;
use crate::errors::AppError;
use crate::state::AppState;

// --- Request DTO ---
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
  pub user_id: String,
}

/// Marks the session as signed in. The cart loads in the background; poll
/// `GET /cart` until `loading` is false.
#[instrument(name = "handler::login", skip(app_state, payload), fields(session_id = %session_id.0, user_id = %payload.user_id))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = payload.user_id.trim();
  if user_id.is_empty() || user_id.contains('/') {
    return Err(AppError::Validation("userId must be a non-empty id without '/'".to_string()));
  }

  let session = app_state.session(&session_id.0)?;
  session.gate.sign_in(user_id);
  info!("Sign-in accepted; cart load started.");
  Ok(HttpResponse::Accepted().json(json!({ "userId": user_id, "loading": true })))
}

#[instrument(name = "handler::logout", skip(app_state), fields(session_id = %session_id.0))]
pub async fn logout_handler(app_state: web::Data<AppState>, session_id: SessionId) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  session.gate.sign_out();
  Ok(HttpResponse::Ok().json(json!({ "message": "Signed out." })))
}

pub async fn session_status_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let identity = session.gate.current();
  Ok(HttpResponse::Ok().json(json!({
    "identityResolving": identity.is_resolving,
    "userId": session.sync.user(),
    "loadState": format!("{:?}", session.sync.load_state()),
  })))
}

pub async fn end_session_handler(
  app_state: web::Data<AppState>,
  session_id: SessionId,
) -> Result<HttpResponse, AppError> {
  if app_state.end_session(&session_id.0) {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::NotFound(format!("No session '{}'", session_id.0)))
  }
}

/// Toasts waiting for this session.
pub async fn notices_handler(app_state: web::Data<AppState>, session_id: SessionId) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&session_id.0)?;
  let notices: Vec<_> = session
    .drain_notices()
    .iter()
    .map(|notice| {
      let kind = match notice {
        SyncNotice::ReadFailed { .. } => "readFailed",
        SyncNotice::WriteFailed { .. } => "writeFailed",
      };
      json!({ "kind": kind, "userId": notice.user_id(), "message": notice.message() })
    })
    .collect();
  Ok(HttpResponse::Ok().json(notices))
}
