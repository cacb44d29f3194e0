// pizzeria/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{message, run_flow, take_output};
use crate::errors::AppError;
use crate::models::{ProductFilter, ProductInput};
use crate::pipelines::contexts::ProductSaveCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct AvailabilityPayload {
  pub available: bool,
}

#[instrument(name = "handler::list_products", skip(app_state, _auth_user))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  query: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.store.list_products(&query).await?;
  info!(count = products.len(), "Products listed.");
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, _auth_user))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .store
    .find_product(path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  Ok(HttpResponse::Ok().json(product))
}

async fn save_product(
  app_state: &web::Data<AppState>,
  product_id: Option<Uuid>,
  input: ProductInput,
) -> Result<crate::models::Product, AppError> {
  let ctx = ProductSaveCtxData::new(app_state.get_ref().clone(), product_id, input);
  let ctx_data = run_flow(app_state, ctx).await?;
  take_output(&ctx_data, |data| data.saved.take())
}

#[instrument(name = "handler::create_product", skip_all, fields(actor_id = %auth_user.id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let product = save_product(&app_state, None, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, auth_user, payload))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let product = save_product(&app_state, Some(path.into_inner()), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::set_product_availability", skip(app_state, auth_user))]
pub async fn set_availability_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<AvailabilityPayload>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let input = ProductInput {
    available: Some(payload.available),
    ..Default::default()
  };
  let product = save_product(&app_state, Some(path.into_inner()), input).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, auth_user))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let product_id = path.into_inner();
  if !app_state.store.delete_product(product_id).await? {
    return Err(AppError::NotFound("Product not found".to_string()));
  }
  info!(%product_id, "Product deleted.");
  Ok(message("Product deleted successfully"))
}
