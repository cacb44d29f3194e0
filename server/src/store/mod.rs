// pizzeria/src/store/mod.rs

//! Persistence seam. Handlers and pipeline steps only see `PizzeriaStore`;
//! `PgStore` backs production, `MemoryStore` backs tests and database-less
//! runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::errors::Result;
use crate::models::{Client, Order, OrderStatus, Product, ProductFilter, User};
use async_trait::async_trait;
use uuid::Uuid;

pub const DUPLICATE_EMAIL: &str = "Email already registered";

/// Lists are sorted by the store: users and clients by name ascending,
/// products and orders newest first. `update_*` and `delete_*` return
/// `false` when the id is unknown. Deleting a client, product or user
/// clears the references orders hold to it.
#[async_trait]
pub trait PizzeriaStore: Send + Sync {
  async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>>;
  async fn list_users(&self) -> Result<Vec<User>>;
  /// Fails with a 400 when the email is taken.
  async fn insert_user(&self, user: &User) -> Result<()>;
  async fn update_user(&self, user: &User) -> Result<bool>;
  async fn delete_user(&self, id: Uuid) -> Result<bool>;

  async fn find_client(&self, id: Uuid) -> Result<Option<Client>>;
  async fn find_clients(&self, ids: &[Uuid]) -> Result<Vec<Client>>;
  async fn list_clients(&self) -> Result<Vec<Client>>;
  async fn insert_client(&self, client: &Client) -> Result<()>;
  async fn update_client(&self, client: &Client) -> Result<bool>;
  async fn delete_client(&self, id: Uuid) -> Result<bool>;

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>>;
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
  async fn insert_product(&self, product: &Product) -> Result<()>;
  async fn update_product(&self, product: &Product) -> Result<bool>;
  async fn delete_product(&self, id: Uuid) -> Result<bool>;

  async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;
  async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>>;
  async fn insert_order(&self, order: &Order) -> Result<()>;
  /// Rewrites the editable fields and items of an order. The stored status
  /// is never touched; `false` when the order is gone or already closed.
  async fn update_order(&self, order: &Order) -> Result<bool>;
  /// Moves an order from `from` to `to`; `false` when it is gone or its
  /// status is no longer `from`.
  async fn update_order_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool>;
  async fn delete_order(&self, id: Uuid) -> Result<bool>;
}
