// stockroom_app/src/web/handlers/product_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use stockroom::{ProductId, ProductInput};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::envelope;

/// Field checks the store leaves to its callers.
fn validate_input(input: &ProductInput) -> Result<(), AppError> {
  if input.name.trim().is_empty() {
    return Err(AppError::BadRequest("Product name must not be empty".to_string()));
  }
  if input.price < 0 {
    return Err(AppError::BadRequest("Product price must not be negative".to_string()));
  }
  if input.stock < 0 {
    return Err(AppError::BadRequest("Product stock must not be negative".to_string()));
  }
  Ok(())
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.stockroom.list_products().await?;
  if products.is_empty() {
    warn!("No products in catalog.");
    return Err(AppError::NotFound("No products found".to_string()));
  }
  info!("Successfully fetched {} products.", products.len());
  Ok(envelope::ok(products, "Products retrieved successfully"))
}

#[instrument(name = "handler::create_product", skip(app_state, body), fields(name = %body.name))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  body: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let input = body.into_inner();
  validate_input(&input)?;
  let product = app_state.stockroom.create_product(&input).await?;
  info!(product_id = product.id, "Product created.");
  Ok(envelope::respond(StatusCode::CREATED, product, "Product created successfully"))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.stockroom.product(path.into_inner()).await?;
  Ok(envelope::ok(product, "Product Detail"))
}

#[instrument(name = "handler::update_product", skip(app_state, path, body), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
  body: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let input = body.into_inner();
  validate_input(&input)?;
  let product = app_state.stockroom.update_product(path.into_inner(), &input).await?;
  Ok(envelope::ok(product, "Product updated successfully"))
}

#[instrument(name = "handler::delete_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.stockroom.delete_product(path.into_inner()).await?;
  info!("Product deleted.");
  Ok(envelope::ok(product, "Product deleted successfully"))
}
