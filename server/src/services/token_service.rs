// pizzeria/src/services/token_service.rs

//! HS256 bearer tokens.

use crate::errors::AppError;
use crate::models::{Role, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  pub role: Role,
  pub iat: i64,
  pub exp: i64,
}

#[instrument(name = "token_service::issue", skip(user, secret), fields(user_id = %user.id))]
pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, AppError> {
  let now = Utc::now();
  let claims = Claims {
    sub: user.id,
    role: user.role,
    iat: now.timestamp(),
    exp: (now + Duration::hours(ttl_hours)).timestamp(),
  };
  encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

/// Checks signature and expiry. Any failure is reported as "Invalid token".
#[instrument(name = "token_service::verify", skip_all)]
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret.as_bytes()),
    &Validation::new(Algorithm::HS256),
  )
  .map(|data| data.claims)
  .map_err(|e| {
    debug!(error = %e, "Token rejected.");
    AppError::Auth("Invalid token".to_string())
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::NewUser;

  const SECRET: &str = "test-secret-of-sufficient-length";

  fn user() -> User {
    NewUser {
      name: "Ana".into(),
      email: "ana@pizzeria.com".into(),
      password_hash: String::new(),
      role: Role::Admin,
    }
    .into_user()
  }

  #[test]
  fn issued_token_verifies() {
    let user = user();
    let token = issue_token(&user, SECRET, 24).unwrap();
    let claims = verify_token(&token, SECRET).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.role, Role::Admin);
    assert!(claims.exp > claims.iat);
  }

  #[test]
  fn wrong_secret_or_expired_token_is_rejected() {
    let user = user();
    let token = issue_token(&user, SECRET, 24).unwrap();
    assert!(matches!(verify_token(&token, "another-secret-entirely"), Err(AppError::Auth(_))));

    let expired = issue_token(&user, SECRET, -2).unwrap();
    assert!(matches!(verify_token(&expired, SECRET), Err(AppError::Auth(_))));
    assert!(verify_token("garbage", SECRET).is_err());
  }
}
