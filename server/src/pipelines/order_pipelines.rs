// pizzeria/src/pipelines/order_pipelines.rs

//! Order creation, editing and status changes.

use crate::errors::{AppError, Result as AppResult};
use crate::models::order::{OrderItem, OrderRequest, OrderStatus, RequestedItem};
use crate::models::{Order, OrderDraft};
use crate::pipelines::contexts::{OrderCreateCtxData, OrderStatusCtxData, OrderUpdateCtxData};
use crate::services::order_service;
use crate::store::PizzeriaStore;
use forno::{ContextData, Pipeline, PipelineControl, Registry};
use std::collections::HashMap;
use tracing::{event, info, instrument, warn, Level};
use uuid::Uuid;

pub fn register_order_pipelines(registry: &Registry<AppError>) {
  register_order_create_pipeline(registry);
  register_order_update_pipeline(registry);
  register_order_status_pipeline(registry);
}

// --- Shared step bodies ---

fn missing(what: &str) -> AppError {
  AppError::Internal(format!("{} missing from order context", what))
}

/// Resolves every line against the catalog. Unknown products are a 400; a
/// line without a price takes the product's current price.
#[instrument(name = "order_steps::price_items", skip_all, fields(lines = requested.len()))]
async fn price_items(store: &dyn PizzeriaStore, requested: &[RequestedItem]) -> AppResult<Vec<OrderItem>> {
  let ids: Vec<Uuid> = requested.iter().map(|i| i.product_id).collect();
  let catalog: HashMap<Uuid, i64> = store
    .find_products(&ids)
    .await?
    .into_iter()
    .map(|p| (p.id, p.price_cents))
    .collect();

  requested
    .iter()
    .map(|line| {
      let catalog_price = catalog
        .get(&line.product_id)
        .ok_or_else(|| AppError::Validation(format!("Product {} not found", line.product_id)))?;
      Ok(OrderItem {
        product_id: Some(line.product_id),
        quantity: line.quantity,
        price_cents: line.price_cents.unwrap_or(*catalog_price),
      })
    })
    .collect()
}

fn build_draft(client_id: Uuid, items: Vec<OrderItem>, request: &OrderRequest) -> AppResult<OrderDraft> {
  OrderDraft::new(client_id, items, request.payment_method, request.observations.clone())
    .ok_or_else(|| AppError::Validation("Order total is too large".to_string()))
}

// --- Create ---

fn register_order_create_pipeline(registry: &Registry<AppError>) {
  let mut create_p = Pipeline::<OrderCreateCtxData, AppError>::new(&[
    ("validate_order_input", false, None),
    ("resolve_order_client", false, None),
    ("price_order_items", false, None),
    ("persist_order", false, None),
    ("populate_order", false, None),
  ]);

  create_p.on_root("validate_order_input", |ctx_data: ContextData<OrderCreateCtxData>| async move {
    let mut guard = ctx_data.write();
    let request = guard.input.clone().validate(true).map_err(|errors| AppError::InvalidFields {
      message: "Validation failed".to_string(),
      errors,
    })?;
    guard.request = Some(request);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  create_p.on_root("resolve_order_client", |ctx_data: ContextData<OrderCreateCtxData>| async move {
    let (client_id, store) = {
      let guard = ctx_data.read();
      let request = guard.request.as_ref().ok_or_else(|| missing("Validated request"))?;
      (request.client_id, guard.app_state.store.clone())
    };
    let client_id = client_id.ok_or_else(|| AppError::Validation("Client is required".to_string()))?;
    let client = store
      .find_client(client_id)
      .await?
      .ok_or_else(|| AppError::Validation("Client not found".to_string()))?;
    ctx_data.write().client = Some(client);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  create_p.on_root("price_order_items", |ctx_data: ContextData<OrderCreateCtxData>| async move {
    let (requested, store) = {
      let guard = ctx_data.read();
      let request = guard.request.as_ref().ok_or_else(|| missing("Validated request"))?;
      (request.items.clone(), guard.app_state.store.clone())
    };
    let priced = price_items(store.as_ref(), &requested).await?;
    ctx_data.write().priced_items = priced;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  create_p.on_root("persist_order", |ctx_data: ContextData<OrderCreateCtxData>| async move {
    let (order, store) = {
      let guard = ctx_data.read();
      let request = guard.request.as_ref().ok_or_else(|| missing("Validated request"))?;
      let client = guard.client.as_ref().ok_or_else(|| missing("Client"))?;
      let draft = build_draft(client.id, guard.priced_items.clone(), request)?;
      (draft.into_order(guard.actor_id), guard.app_state.store.clone())
    };
    store.insert_order(&order).await?;
    info!(order_id = %order.id, total_cents = order.total_cents, "Order created.");
    ctx_data.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  create_p.on_root("populate_order", |ctx_data: ContextData<OrderCreateCtxData>| async move {
    let (order, store) = {
      let guard = ctx_data.read();
      (guard.order.clone(), guard.app_state.store.clone())
    };
    let order = order.ok_or_else(|| missing("Persisted order"))?;
    let view = order_service::populate_order(store.as_ref(), order).await?;
    ctx_data.write().view = Some(view);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(create_p);
  info!("Order create pipeline registered.");
}

// --- Update ---

fn register_order_update_pipeline(registry: &Registry<AppError>) {
  let mut update_p = Pipeline::<OrderUpdateCtxData, AppError>::new(&[
    ("load_order_update", false, None),
    ("ensure_order_editable", false, None),
    ("validate_order_input", false, None),
    ("price_order_items", false, None),
    ("persist_order", false, None),
    ("populate_order", false, None),
  ]);

  update_p.on_root("load_order_update", |ctx_data: ContextData<OrderUpdateCtxData>| async move {
    let (order_id, store) = {
      let guard = ctx_data.read();
      (guard.order_id, guard.app_state.store.clone())
    };
    let order = load_order(store.as_ref(), order_id).await?;
    ctx_data.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  update_p.on_root("ensure_order_editable", |ctx_data: ContextData<OrderUpdateCtxData>| async move {
    let guard = ctx_data.read();
    let order = guard.order.as_ref().ok_or_else(|| missing("Order"))?;
    if !order.status.is_editable() {
      warn!(order_id = %order.id, status = %order.status, "Edit rejected for a closed order.");
      return Err(AppError::Validation(format!("Orders that are {} cannot be edited", order.status)));
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  // The client of an existing order is fixed; a `client` field is ignored.
  update_p.on_root("validate_order_input", |ctx_data: ContextData<OrderUpdateCtxData>| async move {
    let mut guard = ctx_data.write();
    let request = guard.input.clone().validate(false).map_err(|errors| AppError::InvalidFields {
      message: "Validation failed".to_string(),
      errors,
    })?;
    guard.request = Some(request);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  update_p.on_root("price_order_items", |ctx_data: ContextData<OrderUpdateCtxData>| async move {
    let (requested, store) = {
      let guard = ctx_data.read();
      let request = guard.request.as_ref().ok_or_else(|| missing("Validated request"))?;
      (request.items.clone(), guard.app_state.store.clone())
    };
    let priced = price_items(store.as_ref(), &requested).await?;
    ctx_data.write().priced_items = priced;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  update_p.on_root("persist_order", |ctx_data: ContextData<OrderUpdateCtxData>| async move {
    let (order, store) = {
      let guard = ctx_data.read();
      let request = guard.request.as_ref().ok_or_else(|| missing("Validated request"))?;
      let mut order = guard.order.clone().ok_or_else(|| missing("Order"))?;
      // A draft needs a client id; the stored one (possibly cleared) is kept.
      let draft = build_draft(order.client_id.unwrap_or_default(), guard.priced_items.clone(), request)?;
      draft.apply_to(&mut order);
      (order, guard.app_state.store.clone())
    };
    if !store.update_order(&order).await? {
      // Closed or deleted since it was loaded.
      let current = load_order(store.as_ref(), order.id).await?;
      warn!(order_id = %order.id, status = %current.status, "Edit lost a race with a status change.");
      return Err(AppError::Validation(format!("Orders that are {} cannot be edited", current.status)));
    }
    info!(order_id = %order.id, total_cents = order.total_cents, "Order updated.");
    ctx_data.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  update_p.on_root("populate_order", |ctx_data: ContextData<OrderUpdateCtxData>| async move {
    let (order, store) = {
      let guard = ctx_data.read();
      (guard.order.clone(), guard.app_state.store.clone())
    };
    let order = order.ok_or_else(|| missing("Updated order"))?;
    let view = order_service::populate_order(store.as_ref(), order).await?;
    ctx_data.write().view = Some(view);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(update_p);
  info!("Order update pipeline registered.");
}

// --- Status ---

async fn load_order(store: &dyn PizzeriaStore, order_id: Uuid) -> AppResult<Order> {
  store
    .find_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

fn register_order_status_pipeline(registry: &Registry<AppError>) {
  let mut status_p = Pipeline::<OrderStatusCtxData, AppError>::new(&[
    ("load_order_status", false, None),
    ("check_status_transition", false, None),
    ("persist_order_status", false, None),
    ("populate_order", false, None),
  ]);

  status_p.on_root("load_order_status", |ctx_data: ContextData<OrderStatusCtxData>| async move {
    let (order_id, store) = {
      let guard = ctx_data.read();
      (guard.order_id, guard.app_state.store.clone())
    };
    let order = load_order(store.as_ref(), order_id).await?;
    ctx_data.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  status_p.on_root("check_status_transition", |ctx_data: ContextData<OrderStatusCtxData>| async move {
    let mut guard = ctx_data.write();
    let current = guard.order.as_ref().map(|o| o.status).ok_or_else(|| missing("Order"))?;

    let target = match guard.requested.as_deref().map(str::parse::<OrderStatus>) {
      Some(Ok(status)) => status,
      Some(Err(reason)) => return Err(AppError::Validation(reason)),
      None => return Err(AppError::Validation("Status is required".to_string())),
    };

    if guard.cancel_only && !current.can_be_cancelled() {
      return Err(AppError::Validation("Only pending orders can be cancelled".to_string()));
    }
    if !current.can_transition_to(target) {
      let reason = match current {
        OrderStatus::Cancelled => "Cancelled orders cannot be changed".to_string(),
        _ => format!("A {} order cannot become {}", current, target),
      };
      return Err(AppError::Validation(reason));
    }

    event!(Level::DEBUG, from = %current, to = %target, "Status transition accepted.");
    guard.target = Some(target);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  status_p.on_root("persist_order_status", |ctx_data: ContextData<OrderStatusCtxData>| async move {
    let (order_id, current, target, store) = {
      let guard = ctx_data.read();
      (
        guard.order_id,
        guard.order.as_ref().map(|o| o.status),
        guard.target,
        guard.app_state.store.clone(),
      )
    };
    let current = current.ok_or_else(|| missing("Order"))?;
    let target = target.ok_or_else(|| missing("Target status"))?;
    if !store.update_order_status(order_id, current, target).await? {
      load_order(store.as_ref(), order_id).await?;
      return Err(AppError::Validation(
        "The order status changed meanwhile, reload it and try again".to_string(),
      ));
    }
    let order = load_order(store.as_ref(), order_id).await?;
    info!(%order_id, status = %target, "Order status changed.");
    ctx_data.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  status_p.on_root("populate_order", |ctx_data: ContextData<OrderStatusCtxData>| async move {
    let (order, store) = {
      let guard = ctx_data.read();
      (guard.order.clone(), guard.app_state.store.clone())
    };
    let order = order.ok_or_else(|| missing("Order"))?;
    let view = order_service::populate_order(store.as_ref(), order).await?;
    ctx_data.write().view = Some(view);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(status_p);
  info!("Order status pipeline registered.");
}
