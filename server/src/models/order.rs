// pizzeria/src/models/order.rs

use crate::errors::FieldErrors;
use crate::models::client::{Address, Client};
use crate::models::money;
use crate::models::product::Product;
use crate::models::user::{User, UserSummary};
use crate::models::validation::optional_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MAX_OBSERVATIONS_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  #[serde(alias = "pendente")]
  Pending,
  #[serde(alias = "preparando")]
  Preparing,
  #[serde(alias = "pronto")]
  Ready,
  #[serde(alias = "entregue")]
  Delivered,
  #[serde(alias = "cancelado")]
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Preparing => "preparing",
      OrderStatus::Ready => "ready",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  /// A cancelled order is final; a delivered one may only be re-marked
  /// delivered. Everything else may move freely.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    match self {
      OrderStatus::Cancelled => false,
      OrderStatus::Delivered => next == OrderStatus::Delivered,
      _ => true,
    }
  }

  pub fn can_be_cancelled(self) -> bool {
    self == OrderStatus::Pending
  }

  pub fn is_editable(self) -> bool {
    !matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "pending" | "pendente" => Ok(OrderStatus::Pending),
      "preparing" | "preparando" => Ok(OrderStatus::Preparing),
      "ready" | "pronto" => Ok(OrderStatus::Ready),
      "delivered" | "entregue" => Ok(OrderStatus::Delivered),
      "cancelled" | "cancelado" => Ok(OrderStatus::Cancelled),
      other => Err(format!("Status '{}' is not valid", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  #[serde(alias = "dinheiro")]
  Cash,
  #[serde(alias = "cartão", alias = "cartao")]
  Card,
  Pix,
}

impl FromStr for PaymentMethod {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "cash" | "dinheiro" => Ok(PaymentMethod::Cash),
      "card" | "cartão" | "cartao" => Ok(PaymentMethod::Card),
      "pix" => Ok(PaymentMethod::Pix),
      other => Err(format!("Payment method '{}' is not valid", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OrderItem {
  /// `None` once the product has been deleted.
  pub product_id: Option<Uuid>,
  pub quantity: i32,
  pub price_cents: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub client_id: Option<Uuid>,
  pub status: OrderStatus,
  pub payment_method: PaymentMethod,
  pub total_cents: i64,
  pub observations: Option<String>,
  pub created_by: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[sqlx(skip)]
  pub items: Vec<OrderItem>,
}

/// Priced order contents with the total already computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
  pub client_id: Uuid,
  pub items: Vec<OrderItem>,
  pub payment_method: PaymentMethod,
  pub observations: Option<String>,
  pub total_cents: i64,
}

impl OrderDraft {
  /// `None` when the total overflows.
  pub fn new(
    client_id: Uuid,
    items: Vec<OrderItem>,
    payment_method: PaymentMethod,
    observations: Option<String>,
  ) -> Option<Self> {
    let total_cents = items.iter().try_fold(0i64, |acc, item| {
      item
        .price_cents
        .checked_mul(i64::from(item.quantity))
        .and_then(|line| acc.checked_add(line))
    })?;
    Some(Self {
      client_id,
      items,
      payment_method,
      observations,
      total_cents,
    })
  }

  pub fn into_order(self, created_by: Uuid) -> Order {
    let now = Utc::now();
    Order {
      id: Uuid::new_v4(),
      client_id: Some(self.client_id),
      status: OrderStatus::Pending,
      payment_method: self.payment_method,
      total_cents: self.total_cents,
      observations: self.observations,
      created_by: Some(created_by),
      created_at: now,
      updated_at: now,
      items: self.items,
    }
  }

  /// Replaces contents of `order`; client, status and creator are untouched.
  pub fn apply_to(self, order: &mut Order) {
    order.items = self.items;
    order.payment_method = self.payment_method;
    order.observations = self.observations;
    order.total_cents = self.total_cents;
    order.updated_at = Utc::now();
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
  #[serde(alias = "productId")]
  pub product: Option<String>,
  pub quantity: Option<f64>,
  pub price: Option<f64>,
}

/// Body of `POST /orders` and `PUT /orders/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
  #[serde(alias = "clientId")]
  pub client: Option<String>,
  pub items: Option<Vec<OrderItemInput>>,
  pub payment_method: Option<String>,
  pub observations: Option<String>,
}

/// One line as asked for; the price is resolved against the catalog later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedItem {
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_cents: Option<i64>,
}

/// Shape-checked order request, before any lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
  pub client_id: Option<Uuid>,
  pub items: Vec<RequestedItem>,
  pub payment_method: PaymentMethod,
  pub observations: Option<String>,
}

fn parse_quantity(raw: Option<f64>) -> Option<i32> {
  let q = raw?;
  if !q.is_finite() || q.fract() != 0.0 || q < 1.0 || q > f64::from(i32::MAX) {
    return None;
  }
  Some(q as i32)
}

impl OrderInput {
  pub fn validate(self, client_required: bool) -> Result<OrderRequest, FieldErrors> {
    let mut errors = FieldErrors::new();

    // Edits keep the stored client, so whatever was sent is ignored.
    let client_id = match optional_text(self.client).filter(|_| client_required) {
      Some(raw) => match Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(_) => {
          errors.insert("client".into(), format!("{} is not a valid client id", raw));
          None
        }
      },
      None => {
        if client_required {
          errors.insert("client".into(), "Client is required".into());
        }
        None
      }
    };

    let raw_items = self.items.unwrap_or_default();
    if raw_items.is_empty() {
      errors.insert("items".into(), "The order must have at least one item".into());
    }
    let mut items = Vec::with_capacity(raw_items.len());
    for (idx, raw) in raw_items.into_iter().enumerate() {
      let product_id = match optional_text(raw.product).map(|p| Uuid::parse_str(&p)) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => {
          errors.insert(format!("items[{}].product", idx), "Product id is not valid".into());
          None
        }
        None => {
          errors.insert(format!("items[{}].product", idx), "Product is required".into());
          None
        }
      };
      let quantity = parse_quantity(raw.quantity);
      if quantity.is_none() {
        errors.insert(
          format!("items[{}].quantity", idx),
          "Quantity must be an integer of at least 1".into(),
        );
      }
      let price_cents = match raw.price {
        Some(price) => match money::to_cents(price) {
          Some(cents) => Some(cents),
          None => {
            errors.insert(
              format!("items[{}].price", idx),
              "Price must be a number greater than or equal to 0".into(),
            );
            None
          }
        },
        None => None,
      };
      if let (Some(product_id), Some(quantity)) = (product_id, quantity) {
        items.push(RequestedItem {
          product_id,
          quantity,
          price_cents,
        });
      }
    }

    let payment_method = match optional_text(self.payment_method) {
      Some(raw) => raw.parse::<PaymentMethod>().map_err(|e| errors.insert("paymentMethod".into(), e)).ok(),
      None => {
        errors.insert("paymentMethod".into(), "Payment method is required".into());
        None
      }
    };

    let observations = optional_text(self.observations);
    if let Some(obs) = &observations {
      if obs.chars().count() > MAX_OBSERVATIONS_CHARS {
        errors.insert(
          "observations".into(),
          format!("Observations must have at most {} characters", MAX_OBSERVATIONS_CHARS),
        );
      }
    }

    match payment_method {
      Some(payment_method) if errors.is_empty() => Ok(OrderRequest {
        client_id,
        items,
        payment_method,
        observations,
      }),
      _ => Err(errors),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
  pub id: Uuid,
  pub name: String,
  pub phone: String,
  pub email: Option<String>,
  pub address: Address,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
  pub id: Uuid,
  pub name: String,
  #[serde(serialize_with = "money::serialize_cents")]
  pub price: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
  pub product: Option<ProductSummary>,
  pub product_id: Option<Uuid>,
  pub quantity: i32,
  #[serde(serialize_with = "money::serialize_cents")]
  pub price: i64,
}

/// An order with client, products and creator expanded, as returned by
/// every order endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
  pub id: Uuid,
  pub client: Option<ClientSummary>,
  pub items: Vec<OrderItemView>,
  #[serde(serialize_with = "money::serialize_cents")]
  pub total: i64,
  pub status: OrderStatus,
  pub payment_method: PaymentMethod,
  pub observations: Option<String>,
  pub created_by: Option<UserSummary>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderView {
  pub fn assemble(
    order: Order,
    client: Option<&Client>,
    products: &HashMap<Uuid, Product>,
    creator: Option<&User>,
  ) -> Self {
    let items = order
      .items
      .into_iter()
      .map(|item| OrderItemView {
        product: item.product_id.and_then(|id| products.get(&id)).map(|p| ProductSummary {
          id: p.id,
          name: p.name.clone(),
          price: p.price_cents,
        }),
        product_id: item.product_id,
        quantity: item.quantity,
        price: item.price_cents,
      })
      .collect();

    Self {
      id: order.id,
      client: client.map(|c| ClientSummary {
        id: c.id,
        name: c.name.clone(),
        phone: c.phone.clone(),
        email: c.email.clone(),
        address: c.address.clone(),
      }),
      items,
      total: order.total_cents,
      status: order.status,
      payment_method: order.payment_method,
      observations: order.observations,
      created_by: creator.map(User::summary),
      created_at: order.created_at,
      updated_at: order.updated_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(product: &str, quantity: f64, price: Option<f64>) -> OrderItemInput {
    OrderItemInput {
      product: Some(product.into()),
      quantity: Some(quantity),
      price,
    }
  }

  fn valid_input() -> OrderInput {
    OrderInput {
      client: Some(Uuid::new_v4().to_string()),
      items: Some(vec![item(&Uuid::new_v4().to_string(), 2.0, Some(39.9))]),
      payment_method: Some("pix".into()),
      observations: Some("  no onions ".into()),
    }
  }

  #[test]
  fn status_parsing_accepts_portuguese_aliases() {
    assert_eq!("pendente".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
    assert_eq!("Entregue".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
    assert_eq!("cancelled".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
    assert!("lost".parse::<OrderStatus>().is_err());
  }

  #[test]
  fn payment_parsing_accepts_aliases() {
    assert_eq!("cartão".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
    assert_eq!("DINHEIRO".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
    assert!("boleto".parse::<PaymentMethod>().is_err());
  }

  #[test]
  fn status_transitions() {
    use OrderStatus::*;
    assert!(Pending.can_transition_to(Ready));
    assert!(Ready.can_transition_to(Pending));
    assert!(Preparing.can_transition_to(Cancelled));
    assert!(Delivered.can_transition_to(Delivered));
    assert!(!Delivered.can_transition_to(Ready));
    assert!(!Cancelled.can_transition_to(Pending));
    assert!(!Cancelled.can_transition_to(Cancelled));
  }

  #[test]
  fn only_pending_orders_can_be_cancelled() {
    assert!(OrderStatus::Pending.can_be_cancelled());
    assert!(!OrderStatus::Preparing.can_be_cancelled());
    assert!(OrderStatus::Ready.is_editable());
    assert!(!OrderStatus::Delivered.is_editable());
  }

  #[test]
  fn valid_input_is_parsed() {
    let request = valid_input().validate(true).unwrap();
    assert!(request.client_id.is_some());
    assert_eq!(request.items[0].quantity, 2);
    assert_eq!(request.items[0].price_cents, Some(3990));
    assert_eq!(request.payment_method, PaymentMethod::Pix);
    assert_eq!(request.observations.as_deref(), Some("no onions"));
  }

  #[test]
  fn fractional_and_zero_quantities_are_rejected() {
    let mut input = valid_input();
    let product = Uuid::new_v4().to_string();
    input.items = Some(vec![item(&product, 1.5, None), item(&product, 0.0, None)]);
    let errors = input.validate(true).unwrap_err();
    assert!(errors.contains_key("items[0].quantity"));
    assert!(errors.contains_key("items[1].quantity"));
  }

  #[test]
  fn empty_order_and_long_observations_are_rejected() {
    let mut input = valid_input();
    input.items = Some(vec![]);
    input.observations = Some("x".repeat(MAX_OBSERVATIONS_CHARS + 1));
    input.payment_method = Some("boleto".into());
    let errors = input.validate(true).unwrap_err();
    assert!(errors.contains_key("items"));
    assert!(errors.contains_key("observations"));
    assert!(errors.contains_key("paymentMethod"));
  }

  #[test]
  fn client_is_only_required_on_create() {
    let mut input = valid_input();
    input.client = None;
    assert!(input.clone().validate(true).unwrap_err().contains_key("client"));
    assert!(input.validate(false).is_ok());
  }

  #[test]
  fn edits_ignore_the_client_field() {
    let mut input = valid_input();
    input.client = Some("not-a-uuid".into());
    assert!(input.clone().validate(true).unwrap_err().contains_key("client"));

    let request = input.validate(false).unwrap();
    assert_eq!(request.client_id, None);
  }

  #[test]
  fn draft_total_is_sum_of_lines() {
    let items = vec![
      OrderItem {
        product_id: Some(Uuid::new_v4()),
        quantity: 2,
        price_cents: 3990,
      },
      OrderItem {
        product_id: Some(Uuid::new_v4()),
        quantity: 3,
        price_cents: 800,
      },
    ];
    let draft = OrderDraft::new(Uuid::new_v4(), items, PaymentMethod::Cash, None).unwrap();
    assert_eq!(draft.total_cents, 10380);

    let huge = vec![OrderItem {
      product_id: None,
      quantity: i32::MAX,
      price_cents: i64::MAX / 2,
    }];
    assert!(OrderDraft::new(Uuid::new_v4(), huge, PaymentMethod::Cash, None).is_none());
  }
}
