// pizzeria/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{auth_handlers, client_handlers, order_handlers, product_handlers, user_handlers};
use actix_web::{error, web, HttpResponse};
use tracing::debug;

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed bodies, path ids and query strings all become a 400 with the
/// usual `{message}` body.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
      debug!(error = %err, "Rejected JSON body.");
      error::Error::from(AppError::Validation(format!("Invalid request body: {}", err)))
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
      debug!(error = %err, "Rejected path parameter.");
      error::Error::from(AppError::Validation("Invalid id".to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
      debug!(error = %err, "Rejected query string.");
      error::Error::from(AppError::Validation(format!("Invalid query: {}", err)))
    }));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);

  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route("/register", web::post().to(auth_handlers::register_handler))
          .route("/me", web::get().to(auth_handlers::me_handler)),
      )
      .service(
        web::scope("/users")
          .route("", web::get().to(user_handlers::list_users_handler))
          .route("/{id}", web::get().to(user_handlers::get_user_handler))
          .route("/{id}", web::put().to(user_handlers::update_user_handler))
          .route("/{id}", web::delete().to(user_handlers::delete_user_handler)),
      )
      .service(
        web::scope("/clients")
          .route("", web::get().to(client_handlers::list_clients_handler))
          .route("", web::post().to(client_handlers::create_client_handler))
          .route("/{id}", web::get().to(client_handlers::get_client_handler))
          .route("/{id}", web::put().to(client_handlers::update_client_handler))
          .route("/{id}", web::delete().to(client_handlers::delete_client_handler)),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/{id}", web::get().to(product_handlers::get_product_handler))
          .route("/{id}", web::put().to(product_handlers::update_product_handler))
          .route("/{id}", web::delete().to(product_handlers::delete_product_handler))
          .route("/{id}/availability", web::patch().to(product_handlers::set_availability_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{id}", web::get().to(order_handlers::get_order_handler))
          .route("/{id}", web::put().to(order_handlers::update_order_handler))
          .route("/{id}", web::delete().to(order_handlers::delete_order_handler))
          .route("/{id}/status", web::patch().to(order_handlers::change_status_handler))
          .route("/{id}/cancel", web::patch().to(order_handlers::cancel_order_handler)),
      ),
  );
}
