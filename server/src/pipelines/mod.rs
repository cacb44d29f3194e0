// pizzeria/src/pipelines/mod.rs

//! Request pipelines and their registration with the `forno` registry.

use crate::errors::AppError;
use forno::Registry;

pub mod contexts;

pub mod client_pipeline;
pub mod login_pipeline;
pub mod order_pipelines;
pub mod product_pipeline;
pub mod register_pipeline;
pub mod user_pipeline;

/// Registers every pipeline once, at startup.
pub fn register_all_pipelines(registry: &Registry<AppError>) {
  tracing::info!("Registering request pipelines...");

  login_pipeline::register_login_pipeline(registry);
  register_pipeline::register_register_pipeline(registry);
  user_pipeline::register_user_update_pipeline(registry);
  client_pipeline::register_client_pipeline(registry);
  product_pipeline::register_product_pipeline(registry);
  order_pipelines::register_order_pipelines(registry);

  tracing::info!(count = registry.len(), "All request pipelines registered.");
}
