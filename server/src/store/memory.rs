// pizzeria/src/store/memory.rs

use super::{PizzeriaStore, DUPLICATE_EMAIL};
use crate::errors::{AppError, Result};
use crate::models::{Client, Order, OrderStatus, Product, ProductFilter, User};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  clients: HashMap<Uuid, Client>,
  products: HashMap<Uuid, Product>,
  orders: HashMap<Uuid, Order>,
}

/// Process-local store. Everything lives behind one lock so multi-table
/// deletes stay consistent; the lock is never held across an await.
#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn pick<T: Clone>(map: &HashMap<Uuid, T>, ids: &[Uuid]) -> Vec<T> {
  ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

fn replace<T>(map: &mut HashMap<Uuid, T>, id: Uuid, value: T) -> bool {
  match map.get_mut(&id) {
    Some(slot) => {
      *slot = value;
      true
    }
    None => false,
  }
}

#[async_trait]
impl PizzeriaStore for MemoryStore {
  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.read().users.get(&id).cloned())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.tables.read().users.values().find(|u| u.email == email).cloned())
  }

  async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
    Ok(pick(&self.tables.read().users, ids))
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let mut users: Vec<User> = self.tables.read().users.values().cloned().collect();
    users.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(users)
  }

  async fn insert_user(&self, user: &User) -> Result<()> {
    let mut tables = self.tables.write();
    if tables.users.values().any(|u| u.email == user.email) {
      return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
    }
    tables.users.insert(user.id, user.clone());
    Ok(())
  }

  async fn update_user(&self, user: &User) -> Result<bool> {
    let mut tables = self.tables.write();
    if tables.users.values().any(|u| u.email == user.email && u.id != user.id) {
      return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
    }
    Ok(replace(&mut tables.users, user.id, user.clone()))
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    if tables.users.remove(&id).is_none() {
      return Ok(false);
    }
    for order in tables.orders.values_mut().filter(|o| o.created_by == Some(id)) {
      order.created_by = None;
    }
    Ok(true)
  }

  async fn find_client(&self, id: Uuid) -> Result<Option<Client>> {
    Ok(self.tables.read().clients.get(&id).cloned())
  }

  async fn find_clients(&self, ids: &[Uuid]) -> Result<Vec<Client>> {
    Ok(pick(&self.tables.read().clients, ids))
  }

  async fn list_clients(&self) -> Result<Vec<Client>> {
    let mut clients: Vec<Client> = self.tables.read().clients.values().cloned().collect();
    clients.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(clients)
  }

  async fn insert_client(&self, client: &Client) -> Result<()> {
    self.tables.write().clients.insert(client.id, client.clone());
    Ok(())
  }

  async fn update_client(&self, client: &Client) -> Result<bool> {
    Ok(replace(&mut self.tables.write().clients, client.id, client.clone()))
  }

  async fn delete_client(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    if tables.clients.remove(&id).is_none() {
      return Ok(false);
    }
    for order in tables.orders.values_mut().filter(|o| o.client_id == Some(id)) {
      order.client_id = None;
    }
    Ok(true)
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.read().products.get(&id).cloned())
  }

  async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
    Ok(pick(&self.tables.read().products, ids))
  }

  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let mut products: Vec<Product> =
      self.tables.read().products.values().filter(|p| filter.matches(p)).cloned().collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(products)
  }

  async fn insert_product(&self, product: &Product) -> Result<()> {
    self.tables.write().products.insert(product.id, product.clone());
    Ok(())
  }

  async fn update_product(&self, product: &Product) -> Result<bool> {
    Ok(replace(&mut self.tables.write().products, product.id, product.clone()))
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    if tables.products.remove(&id).is_none() {
      return Ok(false);
    }
    for item in tables.orders.values_mut().flat_map(|o| o.items.iter_mut()) {
      if item.product_id == Some(id) {
        item.product_id = None;
      }
    }
    Ok(true)
  }

  async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.read().orders.get(&id).cloned())
  }

  async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .read()
      .orders
      .values()
      .filter(|o| status.map_or(true, |s| o.status == s))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn insert_order(&self, order: &Order) -> Result<()> {
    self.tables.write().orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn update_order(&self, order: &Order) -> Result<bool> {
    match self.tables.write().orders.get_mut(&order.id) {
      Some(stored) if stored.status.is_editable() => {
        stored.client_id = order.client_id;
        stored.payment_method = order.payment_method;
        stored.total_cents = order.total_cents;
        stored.observations = order.observations.clone();
        stored.items = order.items.clone();
        stored.updated_at = order.updated_at;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn update_order_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool> {
    match self.tables.write().orders.get_mut(&id) {
      Some(order) if order.status == from => {
        order.status = to;
        order.updated_at = Utc::now();
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    Ok(self.tables.write().orders.remove(&id).is_some())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::order::OrderItem;
  use crate::models::{Address, ClientDraft, NewUser, OrderDraft, PaymentMethod, ProductInput, Role};

  fn user(name: &str, email: &str) -> User {
    NewUser {
      name: name.into(),
      email: email.into(),
      password_hash: String::new(),
      role: Role::Employee,
    }
    .into_user()
  }

  fn product(name: &str) -> Product {
    ProductInput {
      name: Some(name.into()),
      price: Some(10.0),
      category: Some("pizza".into()),
      ..Default::default()
    }
    .into_draft(None)
    .unwrap()
    .into_product()
  }

  #[tokio::test]
  async fn duplicate_email_is_rejected() {
    let store = MemoryStore::new();
    store.insert_user(&user("Ana", "ana@pizzeria.com")).await.unwrap();
    let err = store.insert_user(&user("Other Ana", "ana@pizzeria.com")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(m) if m == DUPLICATE_EMAIL));
  }

  #[tokio::test]
  async fn users_are_listed_by_name() {
    let store = MemoryStore::new();
    store.insert_user(&user("Zeca", "zeca@pizzeria.com")).await.unwrap();
    store.insert_user(&user("Ana", "ana@pizzeria.com")).await.unwrap();
    let names: Vec<String> = store.list_users().await.unwrap().into_iter().map(|u| u.name).collect();
    assert_eq!(names, vec!["Ana", "Zeca"]);
  }

  #[tokio::test]
  async fn deleting_a_product_clears_order_references() {
    let store = MemoryStore::new();
    let calabresa = product("Calabresa");
    store.insert_product(&calabresa).await.unwrap();

    let items = vec![OrderItem {
      product_id: Some(calabresa.id),
      quantity: 1,
      price_cents: 1000,
    }];
    let order = OrderDraft::new(Uuid::new_v4(), items, PaymentMethod::Pix, None)
      .unwrap()
      .into_order(Uuid::new_v4());
    store.insert_order(&order).await.unwrap();

    assert!(store.delete_product(calabresa.id).await.unwrap());
    assert!(!store.delete_product(calabresa.id).await.unwrap());
    let stored = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.items[0].product_id, None);
  }

  #[tokio::test]
  async fn deleting_a_client_or_user_clears_order_references() {
    let store = MemoryStore::new();
    let ana = user("Ana", "ana@pizzeria.com");
    store.insert_user(&ana).await.unwrap();
    let client = ClientDraft {
      name: "Maria".into(),
      email: None,
      phone: "(11) 98765-4321".into(),
      address: Address::default(),
    }
    .into_client();
    store.insert_client(&client).await.unwrap();

    let order = OrderDraft::new(client.id, vec![], PaymentMethod::Card, None)
      .unwrap()
      .into_order(ana.id);
    store.insert_order(&order).await.unwrap();

    assert!(store.delete_client(client.id).await.unwrap());
    assert!(store.delete_user(ana.id).await.unwrap());
    let stored = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.client_id, None);
    assert_eq!(stored.created_by, None);
  }

  #[tokio::test]
  async fn orders_filter_by_status() {
    let store = MemoryStore::new();
    let order = OrderDraft::new(Uuid::new_v4(), vec![], PaymentMethod::Cash, None)
      .unwrap()
      .into_order(Uuid::new_v4());
    store.insert_order(&order).await.unwrap();

    assert!(store.update_order_status(order.id, OrderStatus::Pending, OrderStatus::Ready).await.unwrap());
    assert_eq!(store.list_orders(Some(OrderStatus::Ready)).await.unwrap().len(), 1);
    assert!(store.list_orders(Some(OrderStatus::Pending)).await.unwrap().is_empty());
    assert!(!store.update_order_status(Uuid::new_v4(), OrderStatus::Pending, OrderStatus::Ready).await.unwrap());
  }

  #[tokio::test]
  async fn status_change_needs_the_expected_current_status() {
    let store = MemoryStore::new();
    let order = OrderDraft::new(Uuid::new_v4(), vec![], PaymentMethod::Cash, None)
      .unwrap()
      .into_order(Uuid::new_v4());
    store.insert_order(&order).await.unwrap();

    assert!(store.update_order_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled).await.unwrap());
    assert!(!store.update_order_status(order.id, OrderStatus::Pending, OrderStatus::Ready).await.unwrap());
    assert_eq!(store.find_order(order.id).await.unwrap().unwrap().status, OrderStatus::Cancelled);
  }

  #[tokio::test]
  async fn stale_edit_does_not_reopen_a_closed_order() {
    let store = MemoryStore::new();
    let order = OrderDraft::new(Uuid::new_v4(), vec![], PaymentMethod::Cash, None)
      .unwrap()
      .into_order(Uuid::new_v4());
    store.insert_order(&order).await.unwrap();

    let mut stale = store.find_order(order.id).await.unwrap().unwrap();
    assert!(store.update_order_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled).await.unwrap());

    stale.payment_method = PaymentMethod::Pix;
    assert!(!store.update_order(&stale).await.unwrap());
    let stored = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
    assert_eq!(stored.payment_method, PaymentMethod::Cash);
  }

  #[tokio::test]
  async fn edit_keeps_a_concurrent_status_change() {
    let store = MemoryStore::new();
    let order = OrderDraft::new(Uuid::new_v4(), vec![], PaymentMethod::Cash, None)
      .unwrap()
      .into_order(Uuid::new_v4());
    store.insert_order(&order).await.unwrap();

    let mut stale = store.find_order(order.id).await.unwrap().unwrap();
    assert!(store.update_order_status(order.id, OrderStatus::Pending, OrderStatus::Preparing).await.unwrap());

    stale.observations = Some("extra cheese".into());
    assert!(store.update_order(&stale).await.unwrap());
    let stored = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Preparing);
    assert_eq!(stored.observations.as_deref(), Some("extra cheese"));
  }
}
