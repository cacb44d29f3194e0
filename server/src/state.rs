// pizzeria/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::store::PizzeriaStore;
use forno::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn PizzeriaStore>,
  pub flows: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the state and registers every request pipeline.
  pub fn new(store: Arc<dyn PizzeriaStore>, config: Arc<AppConfig>) -> Self {
    let flows = Arc::new(Registry::<AppError>::new());
    crate::pipelines::register_all_pipelines(&flows);
    Self { store, flows, config }
  }
}
