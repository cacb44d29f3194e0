// pizzeria/src/lib.rs

//! Pizzeria order management: REST API over users, clients, products and
//! orders. Mutating endpoints run as `forno` pipelines; persistence sits
//! behind [`store::PizzeriaStore`].

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
