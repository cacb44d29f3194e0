// pizzeria/src/web/extractors.rs

use crate::errors::AppError;
use crate::models::User;
use crate::services::token_service;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};
use uuid::Uuid;

/// The caller, resolved from the bearer token and reloaded from the store on
/// every request so deleted users lose access at once.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
  pub fn user(&self) -> &User {
    &self.0
  }

  pub fn id(&self) -> Uuid {
    self.0.id
  }

  pub fn require_admin(&self) -> Result<(), AppError> {
    if self.0.is_admin() {
      Ok(())
    } else {
      warn!(user_id = %self.0.id, "Admin-only action refused.");
      Err(AppError::Forbidden("Access denied".to_string()))
    }
  }

  pub fn require_self_or_admin(&self, target_id: Uuid) -> Result<(), AppError> {
    if self.0.id == target_id {
      return Ok(());
    }
    self.require_admin()
  }
}

/// `Authorization: Bearer <token>`, falling back to `x-auth-token`.
fn token_from_headers(req: &HttpRequest) -> Option<String> {
  let bearer = req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim);
  let fallback = || req.headers().get("x-auth-token").and_then(|v| v.to_str().ok()).map(str::trim);

  bearer.or_else(fallback).filter(|t| !t.is_empty()).map(String::from)
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let app_state = req.app_data::<web::Data<AppState>>().cloned();
    let token = token_from_headers(req);

    Box::pin(async move {
      let app_state =
        app_state.ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;
      let token = token.ok_or_else(|| AppError::Auth("Token not provided".to_string()))?;

      let claims = token_service::verify_token(&token, &app_state.config.jwt_secret)?;
      let user = app_state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Auth("User not found".to_string()))?;

      debug!(user_id = %user.id, role = user.role.as_str(), "Request authenticated.");
      Ok(AuthenticatedUser(user))
    })
  }
}
