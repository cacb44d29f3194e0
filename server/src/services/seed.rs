// pizzeria/src/services/seed.rs

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::{NewUser, Role};
use crate::services::auth_service;
use crate::store::PizzeriaStore;
use tracing::{info, instrument};

/// Creates the configured admin account unless its email is already taken.
/// Returns whether a user was created.
#[instrument(name = "seed::ensure_admin", skip_all, fields(email = %config.admin_email))]
pub async fn ensure_admin(store: &dyn PizzeriaStore, config: &AppConfig) -> Result<bool> {
  let email = config.admin_email.trim().to_lowercase();
  if store.find_user_by_email(&email).await?.is_some() {
    info!("Admin account already present.");
    return Ok(false);
  }

  let admin = NewUser {
    name: config.admin_name.clone(),
    email,
    password_hash: auth_service::hash_password(&config.admin_password)?,
    role: Role::Admin,
  }
  .into_user();
  store.insert_user(&admin).await?;
  info!(user_id = %admin.id, "Admin account created.");
  Ok(true)
}
