// pizzeria/src/services/order_service.rs

//! Expands order references (client, products, creator) for responses.

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderView};
use crate::store::PizzeriaStore;
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
  ids.collect::<HashSet<_>>().into_iter().collect()
}

/// Loads every referenced row once, then assembles the views in input order.
#[instrument(name = "order_service::populate_orders", skip_all, fields(count = orders.len()))]
pub async fn populate_orders(store: &dyn PizzeriaStore, orders: Vec<Order>) -> Result<Vec<OrderView>> {
  let client_ids = unique(orders.iter().filter_map(|o| o.client_id));
  let product_ids = unique(orders.iter().flat_map(|o| o.items.iter().filter_map(|i| i.product_id)));
  let user_ids = unique(orders.iter().filter_map(|o| o.created_by));

  let clients: HashMap<Uuid, _> = store.find_clients(&client_ids).await?.into_iter().map(|c| (c.id, c)).collect();
  let products: HashMap<Uuid, _> = store.find_products(&product_ids).await?.into_iter().map(|p| (p.id, p)).collect();
  let users: HashMap<Uuid, _> = store.find_users(&user_ids).await?.into_iter().map(|u| (u.id, u)).collect();

  Ok(
    orders
      .into_iter()
      .map(|order| {
        let client = order.client_id.and_then(|id| clients.get(&id));
        let creator = order.created_by.and_then(|id| users.get(&id));
        OrderView::assemble(order, client, &products, creator)
      })
      .collect(),
  )
}

pub async fn populate_order(store: &dyn PizzeriaStore, order: Order) -> Result<OrderView> {
  populate_orders(store, vec![order])
    .await?
    .pop()
    .ok_or_else(|| AppError::Internal("Order population returned no view".to_string()))
}
