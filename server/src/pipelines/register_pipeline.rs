// pizzeria/src/pipelines/register_pipeline.rs

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::models::validation::{self, optional_text, required};
use crate::models::{NewUser, Role};
use crate::pipelines::contexts::{RegisterCtxData, ValidatedRegistration};
use crate::services::auth_service::{self, MIN_PASSWORD_LEN};
use crate::store::DUPLICATE_EMAIL;
use forno::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{event, info, warn, Level};

pub fn register_register_pipeline(registry: &Registry<AppError>) {
  let mut register_p = Pipeline::<RegisterCtxData, AppError>::new(&[
    ("validate_register_input", false, None),
    ("check_existing_email", false, None),
    ("create_user", false, None),
  ]);

  register_p.on_root("validate_register_input", validate_register_input);
  register_p.on_root("check_existing_email", check_existing_email);
  register_p.on_root("create_user", create_user);

  registry.register_pipeline(register_p);
  info!("Register pipeline registered.");
}

/// Shared with the user update flow.
pub(crate) fn check_password(errors: &mut FieldErrors, password: &str) {
  if password.chars().count() < MIN_PASSWORD_LEN {
    errors.insert(
      "password".into(),
      format!("Password must have at least {} characters", MIN_PASSWORD_LEN),
    );
  }
}

pub(crate) fn check_email(errors: &mut FieldErrors, email: &str) {
  if !validation::is_valid_email(email) {
    errors.insert("email".into(), format!("{} is not a valid email", email));
  }
}

async fn validate_register_input(ctx_data: ContextData<RegisterCtxData>) -> AppResult<PipelineControl> {
  let input = ctx_data.read().input.clone();
  let mut errors = FieldErrors::new();

  let name = required(&mut errors, "name", "Name", input.name);
  let email = required(&mut errors, "email", "Email", input.email).to_lowercase();
  if !email.is_empty() {
    check_email(&mut errors, &email);
  }
  let password = input.password.unwrap_or_default();
  check_password(&mut errors, &password);
  let role = match optional_text(input.role) {
    Some(raw) => raw.parse::<Role>().unwrap_or_else(|e| {
      errors.insert("role".into(), e);
      Role::default()
    }),
    None => Role::default(),
  };

  AppError::check_fields("Validation failed", errors)?;
  event!(Level::DEBUG, %email, role = role.as_str(), "Registration input valid.");
  ctx_data.write().validated = Some(ValidatedRegistration {
    name,
    email,
    password,
    role,
  });
  Ok(PipelineControl::Continue)
}

fn validated(ctx_data: &ContextData<RegisterCtxData>) -> AppResult<ValidatedRegistration> {
  ctx_data
    .read()
    .validated
    .clone()
    .ok_or_else(|| AppError::Internal("Registration used before validation".to_string()))
}

async fn check_existing_email(ctx_data: ContextData<RegisterCtxData>) -> AppResult<PipelineControl> {
  let registration = validated(&ctx_data)?;
  let store = ctx_data.read().app_state.store.clone();

  if store.find_user_by_email(&registration.email).await?.is_some() {
    warn!(email = %registration.email, "Registration with an existing email.");
    return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn create_user(ctx_data: ContextData<RegisterCtxData>) -> AppResult<PipelineControl> {
  let registration = validated(&ctx_data)?;
  let store = ctx_data.read().app_state.store.clone();

  let user = NewUser {
    name: registration.name,
    email: registration.email,
    password_hash: auth_service::hash_password(&registration.password)?,
    role: registration.role,
  }
  .into_user();
  store.insert_user(&user).await?;

  info!(user_id = %user.id, role = user.role.as_str(), "User registered.");
  ctx_data.write().created_user = Some(user);
  Ok(PipelineControl::Continue)
}
