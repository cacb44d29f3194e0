// pizzeria/src/pipelines/contexts.rs

//! Data carried through each request pipeline. Handlers receive these
//! wrapped in `forno::ContextData`; every pipeline has its own type because
//! the registry dispatches on it.

use crate::errors::FieldErrors;
use crate::models::order::{OrderRequest, OrderStatus};
use crate::models::{
  Client, ClientDraft, ClientInput, LoginInput, Order, OrderInput, OrderItem, OrderView, Product, ProductDraft,
  ProductInput, RegisterInput, Role, User, UserUpdateInput,
};
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct LoginCtxData {
  pub app_state: AppState,
  pub input: LoginInput,
  pub email: String,
  pub password: String,
  pub user: Option<User>,
  pub token: Option<String>,
}

impl LoginCtxData {
  pub fn new(app_state: AppState, input: LoginInput) -> Self {
    Self {
      app_state,
      input,
      email: String::new(),
      password: String::new(),
      user: None,
      token: None,
    }
  }
}

#[derive(Clone)]
pub struct RegisterCtxData {
  pub app_state: AppState,
  pub input: RegisterInput,
  pub validated: Option<ValidatedRegistration>,
  pub created_user: Option<User>,
}

#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
  pub name: String,
  pub email: String,
  pub password: String,
  pub role: Role,
}

impl RegisterCtxData {
  pub fn new(app_state: AppState, input: RegisterInput) -> Self {
    Self {
      app_state,
      input,
      validated: None,
      created_user: None,
    }
  }
}

#[derive(Clone)]
pub struct UserUpdateCtxData {
  pub app_state: AppState,
  pub actor: User,
  pub target_id: Uuid,
  pub input: UserUpdateInput,
  /// Stored user, then the updated copy once validated.
  pub user: Option<User>,
  pub email_changed: bool,
}

impl UserUpdateCtxData {
  pub fn new(app_state: AppState, actor: User, target_id: Uuid, input: UserUpdateInput) -> Self {
    Self {
      app_state,
      actor,
      target_id,
      input,
      user: None,
      email_changed: false,
    }
  }
}

/// Shared by create (`client_id` is `None`) and update.
#[derive(Clone)]
pub struct ClientSaveCtxData {
  pub app_state: AppState,
  pub client_id: Option<Uuid>,
  pub input: ClientInput,
  pub draft: Option<ClientDraft>,
  pub field_errors: FieldErrors,
  pub existing: Option<Client>,
  pub saved: Option<Client>,
}

impl ClientSaveCtxData {
  pub fn new(app_state: AppState, client_id: Option<Uuid>, input: ClientInput) -> Self {
    Self {
      app_state,
      client_id,
      input,
      draft: None,
      field_errors: FieldErrors::new(),
      existing: None,
      saved: None,
    }
  }
}

/// Shared by create (`product_id` is `None`) and update.
#[derive(Clone)]
pub struct ProductSaveCtxData {
  pub app_state: AppState,
  pub product_id: Option<Uuid>,
  pub input: ProductInput,
  pub existing: Option<Product>,
  pub draft: Option<ProductDraft>,
  pub saved: Option<Product>,
}

impl ProductSaveCtxData {
  pub fn new(app_state: AppState, product_id: Option<Uuid>, input: ProductInput) -> Self {
    Self {
      app_state,
      product_id,
      input,
      existing: None,
      draft: None,
      saved: None,
    }
  }
}

#[derive(Clone)]
pub struct OrderCreateCtxData {
  pub app_state: AppState,
  pub actor_id: Uuid,
  pub input: OrderInput,
  pub request: Option<OrderRequest>,
  pub client: Option<Client>,
  pub priced_items: Vec<OrderItem>,
  pub order: Option<Order>,
  pub view: Option<OrderView>,
}

impl OrderCreateCtxData {
  pub fn new(app_state: AppState, actor_id: Uuid, input: OrderInput) -> Self {
    Self {
      app_state,
      actor_id,
      input,
      request: None,
      client: None,
      priced_items: Vec::new(),
      order: None,
      view: None,
    }
  }
}

#[derive(Clone)]
pub struct OrderUpdateCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  pub input: OrderInput,
  pub order: Option<Order>,
  pub request: Option<OrderRequest>,
  pub priced_items: Vec<OrderItem>,
  pub view: Option<OrderView>,
}

impl OrderUpdateCtxData {
  pub fn new(app_state: AppState, order_id: Uuid, input: OrderInput) -> Self {
    Self {
      app_state,
      order_id,
      input,
      order: None,
      request: None,
      priced_items: Vec::new(),
      view: None,
    }
  }
}

/// Drives both `PATCH /orders/:id/status` and `PATCH /orders/:id/cancel`.
#[derive(Clone)]
pub struct OrderStatusCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  /// Raw requested status; parsed by `check_status_transition`.
  pub requested: Option<String>,
  pub cancel_only: bool,
  pub target: Option<OrderStatus>,
  pub order: Option<Order>,
  pub view: Option<OrderView>,
}

impl OrderStatusCtxData {
  pub fn change(app_state: AppState, order_id: Uuid, requested: Option<String>) -> Self {
    Self {
      app_state,
      order_id,
      requested,
      cancel_only: false,
      target: None,
      order: None,
      view: None,
    }
  }

  pub fn cancel(app_state: AppState, order_id: Uuid) -> Self {
    Self {
      cancel_only: true,
      ..Self::change(app_state, order_id, Some(OrderStatus::Cancelled.as_str().to_string()))
    }
  }
}
