// stockroom_app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use stockroom::StockroomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Bad Request: {0}")]
  BadRequest(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Insufficient Stock: {0}")]
  InsufficientStock(String),

  #[error("Method Not Allowed: {0}")]
  MethodNotAllowed(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Service Unavailable: {0}")]
  Unavailable(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<StockroomError> for AppError {
  fn from(err: StockroomError) -> Self {
    match err {
      StockroomError::Validation(m) => AppError::BadRequest(m),
      StockroomError::ProductNotFound { product_id } => {
        AppError::NotFound(format!("Product {} not found", product_id))
      }
      StockroomError::OrderNotFound { order_id } => AppError::NotFound(format!("Order {} not found", order_id)),
      e @ StockroomError::InsufficientStock { .. } => AppError::InsufficientStock(e.to_string()),
      e @ StockroomError::ProductInUse { .. } => AppError::Conflict(e.to_string()),
      e @ StockroomError::Timeout { .. } => AppError::Unavailable(e.to_string()),
      // Database, Backend and Internal: keep the detail in the logs only.
      e => {
        tracing::error!(error = %e, source = ?std::error::Error::source(&e), "Stockroom operation failed");
        AppError::Internal(e.to_string())
      }
    }
  }
}

impl AppError {
  /// What the client gets to read. Server-side failures stay generic.
  fn public_message(&self) -> String {
    match self {
      AppError::BadRequest(m)
      | AppError::NotFound(m)
      | AppError::MethodNotAllowed(m)
      | AppError::InsufficientStock(m)
      | AppError::Conflict(m)
      | AppError::Unavailable(m) => m.clone(),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => "Internal server error".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::BadRequest(_) | AppError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    HttpResponse::build(status).json(json!({ "data": null, "message": self.public_message() }))
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
