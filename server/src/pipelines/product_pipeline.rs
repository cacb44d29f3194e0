// pizzeria/src/pipelines/product_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::ProductSaveCtxData;
use forno::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use std::sync::Arc;
use tracing::{info, warn};

/// Create and update share this pipeline. On update the stored product is
/// loaded first so the payload can be merged over it.
pub fn register_product_pipeline(registry: &Registry<AppError>) {
  let is_create: SkipCondition<ProductSaveCtxData> =
    Arc::new(|ctx: ContextData<ProductSaveCtxData>| ctx.read().product_id.is_none());

  let mut product_p = Pipeline::<ProductSaveCtxData, AppError>::new(&[
    ("ensure_product_exists", false, Some(is_create)),
    ("validate_product_input", false, None),
    ("persist_product", false, None),
  ]);

  product_p.on_root("ensure_product_exists", ensure_product_exists);
  product_p.on_root("validate_product_input", validate_product_input);
  product_p.on_root("persist_product", persist_product);

  registry.register_pipeline(product_p);
  info!("Product save pipeline registered.");
}

async fn ensure_product_exists(ctx_data: ContextData<ProductSaveCtxData>) -> AppResult<PipelineControl> {
  let (product_id, store) = {
    let guard = ctx_data.read();
    (guard.product_id, guard.app_state.store.clone())
  };
  let Some(product_id) = product_id else {
    return Ok(PipelineControl::Continue);
  };

  let existing = store
    .find_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  ctx_data.write().existing = Some(existing);
  Ok(PipelineControl::Continue)
}

async fn validate_product_input(ctx_data: ContextData<ProductSaveCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let input = guard.input.clone();
  match input.into_draft(guard.existing.as_ref()) {
    Ok(draft) => {
      guard.draft = Some(draft);
      Ok(PipelineControl::Continue)
    }
    Err(errors) => {
      warn!(fields = ?errors.keys().collect::<Vec<_>>(), "Product payload rejected.");
      Err(AppError::InvalidFields {
        message: "Validation failed".to_string(),
        errors,
      })
    }
  }
}

async fn persist_product(ctx_data: ContextData<ProductSaveCtxData>) -> AppResult<PipelineControl> {
  let (draft, existing, store) = {
    let guard = ctx_data.read();
    (guard.draft.clone(), guard.existing.clone(), guard.app_state.store.clone())
  };
  let draft = draft.ok_or_else(|| AppError::Internal("Product persisted before validation".to_string()))?;

  let saved = match existing {
    Some(mut product) => {
      draft.apply_to(&mut product);
      if !store.update_product(&product).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
      }
      info!(product_id = %product.id, "Product updated.");
      product
    }
    None => {
      let product = draft.into_product();
      store.insert_product(&product).await?;
      info!(product_id = %product.id, "Product created.");
      product
    }
  };
  ctx_data.write().saved = Some(saved);
  Ok(PipelineControl::Continue)
}
