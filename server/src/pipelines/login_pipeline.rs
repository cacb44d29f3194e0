// pizzeria/src/pipelines/login_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::LoginCtxData;
use crate::services::{auth_service, token_service};
use forno::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{event, info, warn, Level};

const BAD_CREDENTIALS: &str = "Invalid email or password";

pub fn register_login_pipeline(registry: &Registry<AppError>) {
  let mut login_p = Pipeline::<LoginCtxData, AppError>::new(&[
    ("validate_login_input", false, None),
    ("fetch_user_login", false, None),
    ("verify_password_login", false, None),
    ("issue_token_login", false, None),
  ]);

  login_p.on_root("validate_login_input", validate_login_input);
  login_p.on_root("fetch_user_login", fetch_user_login);
  login_p.on_root("verify_password_login", verify_password_login);
  login_p.on_root("issue_token_login", issue_token_login);

  registry.register_pipeline(login_p);
  info!("Login pipeline registered.");
}

async fn validate_login_input(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let email = guard.input.email.clone().unwrap_or_default().trim().to_lowercase();
  let password = guard.input.password.clone().unwrap_or_default();
  if email.is_empty() || password.is_empty() {
    return Err(AppError::Validation("Email and password are required".to_string()));
  }
  guard.email = email;
  guard.password = password;
  Ok(PipelineControl::Continue)
}

async fn fetch_user_login(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let (email, store) = {
    let guard = ctx_data.read();
    (guard.email.clone(), guard.app_state.store.clone())
  };

  match store.find_user_by_email(&email).await? {
    Some(user) => {
      event!(Level::DEBUG, user_id = %user.id, "Login user found.");
      ctx_data.write().user = Some(user);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!("Login attempt for unknown email.");
      Err(AppError::Auth(BAD_CREDENTIALS.to_string()))
    }
  }
}

async fn verify_password_login(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let guard = ctx_data.read();
  let user = guard
    .user
    .as_ref()
    .ok_or_else(|| AppError::Internal("Login user missing before password check".to_string()))?;

  if !auth_service::verify_password(&user.password_hash, &guard.password)? {
    warn!(user_id = %user.id, "Login attempt with wrong password.");
    return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn issue_token_login(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let config = guard.app_state.config.clone();
  let user = guard
    .user
    .as_ref()
    .ok_or_else(|| AppError::Internal("Login user missing before token issue".to_string()))?;

  let token = token_service::issue_token(user, &config.jwt_secret, config.token_ttl_hours)?;
  info!(user_id = %user.id, "User logged in.");
  guard.token = Some(token);
  Ok(PipelineControl::Continue)
}
