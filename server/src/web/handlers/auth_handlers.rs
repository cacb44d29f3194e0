// pizzeria/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use super::{run_flow, take_output};
use crate::errors::AppError;
use crate::models::{LoginInput, RegisterInput};
use crate::pipelines::contexts::{LoginCtxData, RegisterCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::login", skip_all)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginInput>,
) -> Result<HttpResponse, AppError> {
  let ctx_data = run_flow(&app_state, LoginCtxData::new(app_state.get_ref().clone(), payload.into_inner())).await?;

  let (user, token) = {
    let mut guard = ctx_data.write();
    (guard.user.take(), guard.token.take())
  };
  let (Some(user), Some(token)) = (user, token) else {
    return Err(AppError::Internal("Login completed without a user or token".to_string()));
  };

  info!(user_id = %user.id, "Login successful.");
  Ok(HttpResponse::Ok().json(json!({ "user": user, "token": token })))
}

#[instrument(name = "handler::register", skip_all, fields(actor_id = %auth_user.id()))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<RegisterInput>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;

  let ctx_data = run_flow(&app_state, RegisterCtxData::new(app_state.get_ref().clone(), payload.into_inner())).await?;
  let user = take_output(&ctx_data, |data| data.created_user.take())?;
  Ok(HttpResponse::Created().json(user))
}

#[instrument(name = "handler::me", skip_all)]
pub async fn me_handler(auth_user: AuthenticatedUser) -> HttpResponse {
  HttpResponse::Ok().json(auth_user.user())
}
