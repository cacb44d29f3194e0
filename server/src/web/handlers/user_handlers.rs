// pizzeria/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{message, run_flow, take_output};
use crate::errors::AppError;
use crate::models::UserUpdateInput;
use crate::pipelines::contexts::UserUpdateCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_users", skip_all)]
pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let users = app_state.store.list_users().await?;
  Ok(HttpResponse::Ok().json(users))
}

#[instrument(name = "handler::get_user", skip(app_state, auth_user))]
pub async fn get_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  auth_user.require_self_or_admin(user_id)?;

  let user = app_state
    .store
    .find_user(user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::update_user", skip(app_state, auth_user, payload))]
pub async fn update_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<UserUpdateInput>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  auth_user.require_self_or_admin(user_id)?;

  let ctx = UserUpdateCtxData::new(app_state.get_ref().clone(), auth_user.0, user_id, payload.into_inner());
  let ctx_data = run_flow(&app_state, ctx).await?;
  let user = take_output(&ctx_data, |data| data.user.take())?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::delete_user", skip(app_state, auth_user))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let user_id = path.into_inner();
  if user_id == auth_user.id() {
    return Err(AppError::Validation("You cannot delete your own account".to_string()));
  }

  if !app_state.store.delete_user(user_id).await? {
    return Err(AppError::NotFound("User not found".to_string()));
  }
  info!(%user_id, "User deleted.");
  Ok(message("User deleted successfully"))
}
