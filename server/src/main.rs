// pizzeria/src/main.rs

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use pizzeria::config::AppConfig;
use pizzeria::services::seed;
use pizzeria::state::AppState;
use pizzeria::store::{MemoryStore, PgStore, PizzeriaStore};
use pizzeria::web::configure_app_routes;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn cors_for(config: &AppConfig) -> Cors {
  config
    .cors_origins
    .iter()
    .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
    .allowed_headers(vec![
      header::CONTENT_TYPE,
      header::AUTHORIZATION,
      header::HeaderName::from_static("x-auth-token"),
    ])
    .max_age(3600)
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn PizzeriaStore>> {
  match &config.database_url {
    Some(url) => {
      let store = PgStore::connect(url).await.context("connecting to the database")?;
      if config.run_migrations {
        store.migrate().await.context("running database migrations")?;
      }
      Ok(Arc::new(store))
    }
    None => {
      tracing::warn!("DATABASE_URL is not set; using the in-memory store. Data is lost on restart.");
      Ok(Arc::new(MemoryStore::new()))
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting pizzeria server...");

  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);
  let store = open_store(&app_config).await?;

  if app_config.seed_admin {
    seed::ensure_admin(store.as_ref(), &app_config)
      .await
      .context("seeding the admin account")?;
  }

  let app_state = AppState::new(store, app_config.clone());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(cors_for(&app_state.config))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await?;

  Ok(())
}
