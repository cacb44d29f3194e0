// pizzeria/src/pipelines/client_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::ClientSaveCtxData;
use forno::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use std::sync::Arc;
use tracing::{event, info, warn, Level};

/// One pipeline serves create and update; `ensure_client_exists` only runs
/// when a client id is given.
pub fn register_client_pipeline(registry: &Registry<AppError>) {
  let is_create: SkipCondition<ClientSaveCtxData> =
    Arc::new(|ctx: ContextData<ClientSaveCtxData>| ctx.read().client_id.is_none());

  let mut client_p = Pipeline::<ClientSaveCtxData, AppError>::new(&[
    ("normalize_client_input", false, None),
    ("validate_client_fields", false, None),
    ("ensure_client_exists", false, Some(is_create)),
    ("persist_client", false, None),
  ]);

  client_p.on_root("normalize_client_input", normalize_client_input);
  client_p.on_root("validate_client_fields", validate_client_fields);
  client_p.on_root("ensure_client_exists", ensure_client_exists);
  client_p.on_root("persist_client", persist_client);

  registry.register_pipeline(client_p);
  info!("Client save pipeline registered.");
}

async fn normalize_client_input(ctx_data: ContextData<ClientSaveCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx_data.write();
  match guard.input.clone().into_draft() {
    Ok(draft) => guard.draft = Some(draft),
    Err(errors) => guard.field_errors = errors,
  }
  Ok(PipelineControl::Continue)
}

async fn validate_client_fields(ctx_data: ContextData<ClientSaveCtxData>) -> AppResult<PipelineControl> {
  let errors = std::mem::take(&mut ctx_data.write().field_errors);
  if !errors.is_empty() {
    warn!(fields = ?errors.keys().collect::<Vec<_>>(), "Client payload rejected.");
  }
  AppError::check_fields("Validation failed", errors)?;
  Ok(PipelineControl::Continue)
}

async fn ensure_client_exists(ctx_data: ContextData<ClientSaveCtxData>) -> AppResult<PipelineControl> {
  let (client_id, store) = {
    let guard = ctx_data.read();
    (guard.client_id, guard.app_state.store.clone())
  };
  let Some(client_id) = client_id else {
    return Ok(PipelineControl::Continue);
  };

  let existing = store
    .find_client(client_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;
  ctx_data.write().existing = Some(existing);
  Ok(PipelineControl::Continue)
}

async fn persist_client(ctx_data: ContextData<ClientSaveCtxData>) -> AppResult<PipelineControl> {
  let (draft, existing, store) = {
    let guard = ctx_data.read();
    (guard.draft.clone(), guard.existing.clone(), guard.app_state.store.clone())
  };
  let draft = draft.ok_or_else(|| AppError::Internal("Client persisted before normalization".to_string()))?;

  let saved = match existing {
    Some(mut client) => {
      draft.apply_to(&mut client);
      if !store.update_client(&client).await? {
        return Err(AppError::NotFound("Client not found".to_string()));
      }
      event!(Level::INFO, client_id = %client.id, "Client updated.");
      client
    }
    None => {
      let client = draft.into_client();
      store.insert_client(&client).await?;
      event!(Level::INFO, client_id = %client.id, "Client created.");
      client
    }
  };
  ctx_data.write().saved = Some(saved);
  Ok(PipelineControl::Continue)
}
