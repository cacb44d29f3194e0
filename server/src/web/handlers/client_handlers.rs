// pizzeria/src/web/handlers/client_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{message, run_flow, take_output};
use crate::errors::AppError;
use crate::models::ClientInput;
use crate::pipelines::contexts::ClientSaveCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_clients", skip_all)]
pub async fn list_clients_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let clients = app_state.store.list_clients().await?;
  Ok(HttpResponse::Ok().json(clients))
}

#[instrument(name = "handler::get_client", skip(app_state, _auth_user))]
pub async fn get_client_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let client = app_state
    .store
    .find_client(path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;
  Ok(HttpResponse::Ok().json(client))
}

#[instrument(name = "handler::create_client", skip_all, fields(actor_id = %auth_user.id()))]
pub async fn create_client_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ClientInput>,
) -> Result<HttpResponse, AppError> {
  let ctx = ClientSaveCtxData::new(app_state.get_ref().clone(), None, payload.into_inner());
  let ctx_data = run_flow(&app_state, ctx).await?;
  let client = take_output(&ctx_data, |data| data.saved.take())?;
  Ok(HttpResponse::Created().json(client))
}

#[instrument(name = "handler::update_client", skip(app_state, _auth_user, payload))]
pub async fn update_client_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ClientInput>,
) -> Result<HttpResponse, AppError> {
  let ctx = ClientSaveCtxData::new(app_state.get_ref().clone(), Some(path.into_inner()), payload.into_inner());
  let ctx_data = run_flow(&app_state, ctx).await?;
  let client = take_output(&ctx_data, |data| data.saved.take())?;
  Ok(HttpResponse::Ok().json(client))
}

#[instrument(name = "handler::delete_client", skip(app_state, auth_user))]
pub async fn delete_client_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let client_id = path.into_inner();
  if !app_state.store.delete_client(client_id).await? {
    return Err(AppError::NotFound("Client not found".to_string()));
  }
  info!(%client_id, "Client deleted.");
  Ok(message("Client deleted successfully"))
}
