// pizzeria/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{message, run_flow, take_output};
use crate::errors::AppError;
use crate::models::{OrderInput, OrderStatus};
use crate::pipelines::contexts::{OrderCreateCtxData, OrderStatusCtxData, OrderUpdateCtxData};
use crate::services::order_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct OrderListQuery {
  pub status: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
  pub status: Option<String>,
}

#[instrument(name = "handler::list_orders", skip(app_state, _auth_user))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    Some(raw) => Some(raw.parse::<OrderStatus>().map_err(AppError::Validation)?),
    None => None,
  };
  let orders = app_state.store.list_orders(status).await?;
  let views = order_service::populate_orders(app_state.store.as_ref(), orders).await?;
  Ok(HttpResponse::Ok().json(views))
}

#[instrument(name = "handler::get_order", skip(app_state, _auth_user))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .store
    .find_order(path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  let view = order_service::populate_order(app_state.store.as_ref(), order).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::create_order", skip_all, fields(actor_id = %auth_user.id()))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<OrderInput>,
) -> Result<HttpResponse, AppError> {
  let ctx = OrderCreateCtxData::new(app_state.get_ref().clone(), auth_user.id(), payload.into_inner());
  let ctx_data = run_flow(&app_state, ctx).await?;
  let view = take_output(&ctx_data, |data| data.view.take())?;
  Ok(HttpResponse::Created().json(view))
}

#[instrument(name = "handler::update_order", skip(app_state, _auth_user, payload))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<OrderInput>,
) -> Result<HttpResponse, AppError> {
  let ctx = OrderUpdateCtxData::new(app_state.get_ref().clone(), path.into_inner(), payload.into_inner());
  let ctx_data = run_flow(&app_state, ctx).await?;
  let view = take_output(&ctx_data, |data| data.view.take())?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::change_order_status", skip(app_state, auth_user, payload), fields(actor_id = %auth_user.id()))]
pub async fn change_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<StatusPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = OrderStatusCtxData::change(app_state.get_ref().clone(), path.into_inner(), payload.into_inner().status);
  let ctx_data = run_flow(&app_state, ctx).await?;
  let view = take_output(&ctx_data, |data| data.view.take())?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user), fields(actor_id = %auth_user.id()))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let ctx = OrderStatusCtxData::cancel(app_state.get_ref().clone(), path.into_inner());
  let ctx_data = run_flow(&app_state, ctx).await?;
  let view = take_output(&ctx_data, |data| data.view.take())?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::delete_order", skip(app_state, auth_user))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let order_id = path.into_inner();
  if !app_state.store.delete_order(order_id).await? {
    return Err(AppError::NotFound("Order not found".to_string()));
  }
  info!(%order_id, "Order deleted.");
  Ok(message("Order deleted successfully"))
}
