// stockroom_app/src/web/routes.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::web::envelope;
use crate::web::handlers::{order_handlers, product_handlers};

async fn health_check_handler() -> HttpResponse {
  envelope::ok(json!({ "status": "ok" }), "Service is healthy")
}

/// Known path, unsupported method.
async fn method_not_allowed_handler(req: HttpRequest) -> Result<HttpResponse, AppError> {
  tracing::debug!(method = %req.method(), path = %req.path(), "Rejected request method");
  Err(AppError::MethodNotAllowed("Invalid request method".to_string()))
}

/// Fallback for paths no route matches. Also installed as the app-wide default service in `main`.
pub async fn route_not_found_handler(req: HttpRequest) -> Result<HttpResponse, AppError> {
  Err(AppError::NotFound(format!("No route for {} {}", req.method(), req.path())))
}

fn path_error_handler(err: actix_web::error::PathError, req: &HttpRequest) -> actix_web::Error {
  tracing::debug!(path = %req.path(), error = %err, "Rejected path parameter");
  AppError::BadRequest("Invalid ID".to_string()).into()
}

fn json_error_handler(err: actix_web::error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
  tracing::debug!(path = %req.path(), error = %err, "Rejected request body");
  AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}

// This function will be called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .service(
      web::scope("/api")
        .service(
          web::resource("/health")
            .route(web::get().to(health_check_handler))
            .default_service(web::to(method_not_allowed_handler)),
        )
        .service(
          web::scope("/products")
            .service(
              web::resource("")
                .route(web::get().to(product_handlers::list_products_handler))
                .route(web::post().to(product_handlers::create_product_handler))
                .default_service(web::to(method_not_allowed_handler)),
            )
            .service(
              web::resource("/{product_id}")
                .route(web::get().to(product_handlers::get_product_handler))
                .route(web::put().to(product_handlers::update_product_handler))
                .route(web::delete().to(product_handlers::delete_product_handler))
                .default_service(web::to(method_not_allowed_handler)),
            )
            .default_service(web::to(route_not_found_handler)),
        )
        .service(
          web::scope("/orders")
            .service(
              web::resource("")
                .route(web::get().to(order_handlers::list_orders_handler))
                .route(web::post().to(order_handlers::create_order_handler))
                .default_service(web::to(method_not_allowed_handler)),
            )
            .service(
              web::resource("/{order_id}")
                .route(web::get().to(order_handlers::get_order_handler))
                .route(web::delete().to(order_handlers::delete_order_handler))
                .default_service(web::to(method_not_allowed_handler)),
            )
            .default_service(web::to(route_not_found_handler)),
        )
        .default_service(web::to(route_not_found_handler)),
    );
}
