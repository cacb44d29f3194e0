// pizzeria/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  Employee,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Employee => "employee",
    }
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "employee" => Ok(Role::Employee),
      other => Err(format!("Role '{}' is not valid", other)),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  pub fn summary(&self) -> UserSummary {
    UserSummary {
      id: self.id,
      name: self.name.clone(),
    }
  }
}

/// A user ready to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub role: Role,
}

impl NewUser {
  pub fn into_user(self) -> User {
    let now = Utc::now();
    User {
      id: Uuid::new_v4(),
      name: self.name,
      email: self.email,
      password_hash: self.password_hash,
      role: self.role,
      created_at: now,
      updated_at: now,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
  pub email: Option<String>,
  pub password: Option<String>,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password: Option<String>,
  pub role: Option<String>,
}

/// Body of `PUT /users/:id`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateInput {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password: Option<String>,
  pub role: Option<String>,
}

/// Expanded `createdBy` reference on orders.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
  pub id: Uuid,
  pub name: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parsing_is_case_insensitive() {
    assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
    assert_eq!(" employee ".parse::<Role>(), Ok(Role::Employee));
    assert!("chef".parse::<Role>().is_err());
  }

  #[test]
  fn password_hash_is_never_serialized() {
    let user = NewUser {
      name: "Ana".into(),
      email: "ana@pizzeria.com".into(),
      password_hash: "$argon2id$secret".into(),
      role: Role::Employee,
    }
    .into_user();

    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("passwordHash").is_none());
    assert_eq!(json["role"], "employee");
    assert!(json.get("createdAt").is_some());
  }
}
