// pizzeria/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod client_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod user_handlers;

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::HttpResponse;
use forno::{ContextData, PipelineResult};
use serde_json::json;
use tracing::warn;

/// Runs the pipeline registered for `T` and hands back its context. A run
/// that stops early without an error is treated as a server fault, since
/// every step reports refusals as `AppError`.
pub(crate) async fn run_flow<T>(app_state: &AppState, data: T) -> Result<ContextData<T>, AppError>
where
  T: Send + Sync + 'static,
{
  let ctx_data = ContextData::new(data);
  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => Ok(ctx_data),
    PipelineResult::Stopped => {
      warn!(context = std::any::type_name::<T>(), "Pipeline stopped without an error.");
      Err(AppError::Internal("Request processing was halted".to_string()))
    }
  }
}

/// Pulls a result slot out of a finished context.
pub(crate) fn take_output<T, O>(ctx_data: &ContextData<T>, pick: impl FnOnce(&mut T) -> Option<O>) -> Result<O, AppError>
where
  T: Send + Sync + 'static,
{
  let mut guard = ctx_data.write();
  pick(&mut *guard).ok_or_else(|| AppError::Internal("Pipeline completed without a result".to_string()))
}

pub(crate) fn message(text: &str) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "message": text }))
}
