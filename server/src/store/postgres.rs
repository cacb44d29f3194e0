// pizzeria/src/store/postgres.rs

use super::{PizzeriaStore, DUPLICATE_EMAIL};
use crate::errors::{AppError, Result};
use crate::models::order::OrderItem;
use crate::models::{Client, Order, OrderStatus, Product, ProductFilter, User};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{event, instrument, Level};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";
const CLIENT_COLUMNS: &str =
  "id, name, email, phone, street, number, complement, neighborhood, city, state, zip_code, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
  "id, name, description, price_cents, category, ingredients, image, available, created_at, updated_at";
const ORDER_COLUMNS: &str =
  "id, client_id, status, payment_method, total_cents, observations, created_by, created_at, updated_at";

#[derive(FromRow)]
struct ItemRow {
  order_id: Uuid,
  #[sqlx(flatten)]
  item: OrderItem,
}

/// Maps a unique violation on `users.email` to the 400 callers expect.
fn user_write_error(err: sqlx::Error) -> AppError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return AppError::Validation(DUPLICATE_EMAIL.to_string());
    }
  }
  AppError::Sqlx(err)
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    event!(Level::INFO, "Connected to the database.");
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "PgStore::migrate", skip(self), err(Display))]
  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    event!(Level::INFO, "Database migrations applied.");
    Ok(())
  }

  /// Attaches items to already loaded orders, keeping their stored order.
  async fn attach_items(&self, orders: &mut [Order]) -> Result<()> {
    if orders.is_empty() {
      return Ok(());
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let rows = sqlx::query_as::<_, ItemRow>(
      "SELECT order_id, product_id, quantity, price_cents FROM order_items
       WHERE order_id = ANY($1) ORDER BY order_id, position",
    )
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in rows {
      by_order.entry(row.order_id).or_default().push(row.item);
    }
    for order in orders.iter_mut() {
      order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(())
  }

  async fn write_items(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
      .bind(order.id)
      .execute(&mut **tx)
      .await?;
    for (position, item) in order.items.iter().enumerate() {
      sqlx::query(
        "INSERT INTO order_items (order_id, position, product_id, quantity, price_cents)
         VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(order.id)
      .bind(position as i32)
      .bind(item.product_id)
      .bind(item.quantity)
      .bind(item.price_cents)
      .execute(&mut **tx)
      .await?;
    }
    Ok(())
  }

  async fn delete_by_id(&self, table: &str, id: Uuid) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl PizzeriaStore for PgStore {
  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY name ASC", USER_COLUMNS))
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn insert_user(&self, user: &User) -> Result<()> {
    sqlx::query(
      "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&self.pool)
    .await
    .map_err(user_write_error)?;
    Ok(())
  }

  async fn update_user(&self, user: &User) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE users SET name = $2, email = $3, password_hash = $4, role = $5, updated_at = $6 WHERE id = $1",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.updated_at)
    .execute(&self.pool)
    .await
    .map_err(user_write_error)?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("users", id).await
  }

  async fn find_client(&self, id: Uuid) -> Result<Option<Client>> {
    Ok(
      sqlx::query_as::<_, Client>(&format!("SELECT {} FROM clients WHERE id = $1", CLIENT_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_clients(&self, ids: &[Uuid]) -> Result<Vec<Client>> {
    Ok(
      sqlx::query_as::<_, Client>(&format!("SELECT {} FROM clients WHERE id = ANY($1)", CLIENT_COLUMNS))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_clients(&self) -> Result<Vec<Client>> {
    Ok(
      sqlx::query_as::<_, Client>(&format!("SELECT {} FROM clients ORDER BY name ASC", CLIENT_COLUMNS))
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn insert_client(&self, client: &Client) -> Result<()> {
    let a = &client.address;
    sqlx::query(
      "INSERT INTO clients (id, name, email, phone, street, number, complement, neighborhood, city, state, zip_code, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(client.id)
    .bind(&client.name)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&a.street)
    .bind(&a.number)
    .bind(&a.complement)
    .bind(&a.neighborhood)
    .bind(&a.city)
    .bind(&a.state)
    .bind(&a.zip_code)
    .bind(client.created_at)
    .bind(client.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn update_client(&self, client: &Client) -> Result<bool> {
    let a = &client.address;
    let result = sqlx::query(
      "UPDATE clients SET name = $2, email = $3, phone = $4, street = $5, number = $6, complement = $7,
       neighborhood = $8, city = $9, state = $10, zip_code = $11, updated_at = $12 WHERE id = $1",
    )
    .bind(client.id)
    .bind(&client.name)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&a.street)
    .bind(&a.number)
    .bind(&a.complement)
    .bind(&a.neighborhood)
    .bind(&a.city)
    .bind(&a.state)
    .bind(&a.zip_code)
    .bind(client.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_client(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("clients", id).await
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products
         WHERE ($1::TEXT IS NULL OR category = $1) AND ($2::BOOLEAN IS NULL OR available = $2)
         ORDER BY created_at DESC",
        PRODUCT_COLUMNS
      ))
      .bind(&filter.category)
      .bind(filter.available)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn insert_product(&self, product: &Product) -> Result<()> {
    sqlx::query(
      "INSERT INTO products (id, name, description, price_cents, category, ingredients, image, available, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(&product.category)
    .bind(&product.ingredients)
    .bind(&product.image)
    .bind(product.available)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn update_product(&self, product: &Product) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE products SET name = $2, description = $3, price_cents = $4, category = $5, ingredients = $6,
       image = $7, available = $8, updated_at = $9 WHERE id = $1",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(&product.category)
    .bind(&product.ingredients)
    .bind(&product.image)
    .bind(product.available)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("products", id).await
  }

  async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    match order {
      Some(order) => {
        let mut orders = [order];
        self.attach_items(&mut orders).await?;
        let [order] = orders;
        Ok(Some(order))
      }
      None => Ok(None),
    }
  }

  async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
    let mut orders = sqlx::query_as::<_, Order>(&format!(
      "SELECT {} FROM orders WHERE ($1::order_status IS NULL OR status = $1) ORDER BY created_at DESC",
      ORDER_COLUMNS
    ))
    .bind(status)
    .fetch_all(&self.pool)
    .await?;
    self.attach_items(&mut orders).await?;
    Ok(orders)
  }

  #[instrument(name = "PgStore::insert_order", skip_all, fields(order_id = %order.id), err(Display))]
  async fn insert_order(&self, order: &Order) -> Result<()> {
    let mut tx = self.pool.begin().await?;
    sqlx::query(
      "INSERT INTO orders (id, client_id, status, payment_method, total_cents, observations, created_by, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(order.id)
    .bind(order.client_id)
    .bind(order.status)
    .bind(order.payment_method)
    .bind(order.total_cents)
    .bind(&order.observations)
    .bind(order.created_by)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;
    Self::write_items(&mut tx, order).await?;
    tx.commit().await?;
    Ok(())
  }

  #[instrument(name = "PgStore::update_order", skip_all, fields(order_id = %order.id), err(Display))]
  async fn update_order(&self, order: &Order) -> Result<bool> {
    let mut tx = self.pool.begin().await?;
    let result = sqlx::query(
      "UPDATE orders SET client_id = $2, payment_method = $3, total_cents = $4,
       observations = $5, updated_at = $6
       WHERE id = $1 AND status NOT IN ('cancelled', 'delivered')",
    )
    .bind(order.id)
    .bind(order.client_id)
    .bind(order.payment_method)
    .bind(order.total_cents)
    .bind(&order.observations)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
      tx.rollback().await?;
      return Ok(false);
    }
    Self::write_items(&mut tx, order).await?;
    tx.commit().await?;
    Ok(true)
  }

  async fn update_order_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE orders SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2")
      .bind(id)
      .bind(from)
      .bind(to)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("orders", id).await
  }
}
