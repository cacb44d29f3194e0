// pizzeria/src/models/mod.rs

//! Persisted entities, their request payloads and the field-level rules
//! applied before anything reaches the store.

pub mod client;
pub mod money;
pub mod order;
pub mod product;
pub mod user;
pub mod validation;

pub use client::{Address, Client, ClientDraft, ClientInput};
pub use order::{Order, OrderDraft, OrderInput, OrderItem, OrderStatus, OrderView, PaymentMethod};
pub use product::{Product, ProductDraft, ProductFilter, ProductInput};
pub use user::{LoginInput, NewUser, RegisterInput, Role, User, UserSummary, UserUpdateInput};
