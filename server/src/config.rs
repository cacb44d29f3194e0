// pizzeria/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` selects the in-memory store.
  pub database_url: Option<String>,
  pub run_migrations: bool,

  pub jwt_secret: String,
  pub token_ttl_hours: i64,

  pub cors_origins: Vec<String>,

  // Initial admin account, created on startup when `seed_admin` is set.
  pub seed_admin: bool,
  pub admin_name: String,
  pub admin_email: String,
  pub admin_password: String,
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: String) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  raw
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_or = |var_name: &str, default: &str| env::var(var_name).unwrap_or_else(|_| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var("SERVER_PORT", get_or("SERVER_PORT", "3001"))?;
    let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
    let run_migrations = parse_var("RUN_MIGRATIONS", get_or("RUN_MIGRATIONS", "true"))?;

    let jwt_secret = get_env("JWT_SECRET")?;
    if jwt_secret.len() < 16 {
      return Err(AppError::Config("JWT_SECRET must be at least 16 characters long".to_string()));
    }
    let token_ttl_hours: i64 = parse_var("TOKEN_TTL_HOURS", get_or("TOKEN_TTL_HOURS", "24"))?;
    if token_ttl_hours <= 0 {
      return Err(AppError::Config("TOKEN_TTL_HOURS must be positive".to_string()));
    }

    let cors_origins = get_or(
      "CORS_ORIGINS",
      "http://localhost:5173,http://localhost:5174,http://localhost:5175",
    )
    .split(',')
    .map(str::trim)
    .filter(|origin| !origin.is_empty())
    .map(String::from)
    .collect();

    let seed_admin = parse_var("SEED_ADMIN", get_or("SEED_ADMIN", "false"))?;
    let admin_name = get_or("ADMIN_NAME", "Administrator");
    let admin_email = get_or("ADMIN_EMAIL", "admin@pizzeria.com");
    let admin_password = get_or("ADMIN_PASSWORD", "admin123");

    tracing::info!(
      host = %server_host,
      port = server_port,
      persistent_store = database_url.is_some(),
      seed_admin,
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      run_migrations,
      jwt_secret,
      token_ttl_hours,
      cors_origins,
      seed_admin,
      admin_name,
      admin_email,
      admin_password,
    })
  }
}
