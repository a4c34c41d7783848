// stockroom_app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use stockroom::{LineRequest, OrderId};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::envelope;

#[derive(Deserialize, Debug)]
pub struct CreateOrderRequest {
  pub products: Vec<LineRequest>,
}

#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = app_state.stockroom.list_orders().await?;
  info!("Successfully fetched {} orders.", orders.len());
  Ok(envelope::ok(orders, "Order List"))
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, body),
  fields(line_count = body.products.len())
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.stockroom.create_order(&body.products).await?;
  info!(order_id = order.id, "Order created.");
  Ok(envelope::ok(order, "Order created"))
}

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<OrderId>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.stockroom.order(path.into_inner()).await?;
  Ok(envelope::ok(order, "Order Detail"))
}

#[instrument(name = "handler::delete_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<OrderId>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.stockroom.delete_order(path.into_inner()).await?;
  Ok(envelope::ok(order, "Order deleted successfully"))
}
