// pizzeria/src/pipelines/user_pipeline.rs

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::models::validation::optional_text;
use crate::models::Role;
use crate::pipelines::contexts::UserUpdateCtxData;
use crate::pipelines::register_pipeline::{check_email, check_password};
use crate::services::auth_service;
use crate::store::DUPLICATE_EMAIL;
use chrono::Utc;
use forno::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_user_update_pipeline(registry: &Registry<AppError>) {
  let email_unchanged: SkipCondition<UserUpdateCtxData> =
    Arc::new(|ctx: ContextData<UserUpdateCtxData>| !ctx.read().email_changed);

  let mut update_p = Pipeline::<UserUpdateCtxData, AppError>::new(&[
    ("load_user_update", false, None),
    ("validate_user_update", false, None),
    ("check_email_conflict", false, Some(email_unchanged)),
    ("persist_user_update", false, None),
  ]);

  update_p.on_root("load_user_update", load_user_update);
  update_p.on_root("validate_user_update", validate_user_update);
  update_p.on_root("check_email_conflict", check_email_conflict);
  update_p.on_root("persist_user_update", persist_user_update);

  registry.register_pipeline(update_p);
  info!("User update pipeline registered.");
}

async fn load_user_update(ctx_data: ContextData<UserUpdateCtxData>) -> AppResult<PipelineControl> {
  let (target_id, store) = {
    let guard = ctx_data.read();
    (guard.target_id, guard.app_state.store.clone())
  };
  let user = store
    .find_user(target_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
  ctx_data.write().user = Some(user);
  Ok(PipelineControl::Continue)
}

/// Applies the payload onto the loaded user. A role change from a
/// non-admin is ignored.
async fn validate_user_update(ctx_data: ContextData<UserUpdateCtxData>) -> AppResult<PipelineControl> {
  let (input, actor_is_admin, mut user) = {
    let guard = ctx_data.read();
    let user = guard
      .user
      .clone()
      .ok_or_else(|| AppError::Internal("User update validated before load".to_string()))?;
    (guard.input.clone(), guard.actor.is_admin(), user)
  };
  let mut errors = FieldErrors::new();

  if let Some(raw) = input.name {
    match optional_text(Some(raw)) {
      Some(name) => user.name = name,
      None => {
        errors.insert("name".into(), "Name is required".into());
      }
    }
  }

  let mut email_changed = false;
  if let Some(raw) = input.email {
    let email = raw.trim().to_lowercase();
    check_email(&mut errors, &email);
    email_changed = email != user.email;
    user.email = email;
  }

  let new_password = optional_text(input.password);
  if let Some(password) = &new_password {
    check_password(&mut errors, password);
  }

  if let Some(raw) = optional_text(input.role) {
    match raw.parse::<Role>() {
      Ok(role) if actor_is_admin => user.role = role,
      Ok(_) => warn!(user_id = %user.id, "Ignoring role change requested by a non-admin."),
      Err(e) => {
        errors.insert("role".into(), e);
      }
    }
  }

  AppError::check_fields("Validation failed", errors)?;

  if let Some(password) = new_password {
    user.password_hash = auth_service::hash_password(&password)?;
  }
  user.updated_at = Utc::now();

  let mut guard = ctx_data.write();
  guard.user = Some(user);
  guard.email_changed = email_changed;
  Ok(PipelineControl::Continue)
}

async fn check_email_conflict(ctx_data: ContextData<UserUpdateCtxData>) -> AppResult<PipelineControl> {
  let (user_id, email, store) = {
    let guard = ctx_data.read();
    let user = guard
      .user
      .as_ref()
      .ok_or_else(|| AppError::Internal("Email check before user load".to_string()))?;
    (user.id, user.email.clone(), guard.app_state.store.clone())
  };

  if let Some(other) = store.find_user_by_email(&email).await? {
    if other.id != user_id {
      warn!(%user_id, "Email change collides with another account.");
      return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
    }
  }
  Ok(PipelineControl::Continue)
}

async fn persist_user_update(ctx_data: ContextData<UserUpdateCtxData>) -> AppResult<PipelineControl> {
  let (user, store) = {
    let guard = ctx_data.read();
    (guard.user.clone(), guard.app_state.store.clone())
  };
  let user = user.ok_or_else(|| AppError::Internal("Nothing to persist for user update".to_string()))?;

  if !store.update_user(&user).await? {
    return Err(AppError::NotFound("User not found".to_string()));
  }
  info!(user_id = %user.id, "User updated.");
  Ok(PipelineControl::Continue)
}
