// stockroom/src/orders/transaction.rs

//! Order placement and removal. Each runs inside a single store transaction:
//! either every stock movement and every inserted or deleted row becomes
//! visible, or none of them does.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{event, info, instrument, warn, Level};

use crate::error::{StockroomError, StockroomResult};
use crate::model::{LineRequest, Order, OrderId, OrderLine, Product, ProductId};
use crate::store::{OrderStore, StockTransaction};

/// Rejects requests that can never succeed, before any connection is taken.
pub fn validate_request(lines: &[LineRequest]) -> StockroomResult<()> {
  if lines.is_empty() {
    return Err(StockroomError::Validation("an order needs at least one product".to_string()));
  }
  if let Some(bad) = lines.iter().find(|l| l.quantity <= 0) {
    return Err(StockroomError::Validation(format!(
      "quantity for product {} must be positive, got {}",
      bad.product_id, bad.quantity
    )));
  }
  Ok(())
}

/// Places an order for `lines`.
///
/// Lines are processed strictly in the submitted order; the first unknown
/// product or short stock aborts the whole order and rolls back every change
/// made for earlier lines. The returned lines carry the product state right
/// after this order's stock movement.
#[instrument(name = "orders::place_order", skip(store, lines), fields(line_count = lines.len()), err(Display))]
pub async fn place_order<S>(store: &S, lines: &[LineRequest]) -> StockroomResult<Order>
where
  S: OrderStore + ?Sized,
{
  validate_request(lines)?;
  let now = Utc::now();

  let mut tx = store.begin().await?;
  let outcome = reserve_and_record(tx.as_mut(), lines, now).await;
  match outcome {
    Ok(order) => {
      tx.commit().await?;
      info!(order_id = order.id, lines = order.products.len(), "Order placed.");
      Ok(order)
    }
    Err(e) => abort(tx, e).await,
  }
}

async fn reserve_and_record(
  tx: &mut dyn StockTransaction,
  lines: &[LineRequest],
  now: DateTime<Utc>,
) -> StockroomResult<Order> {
  let mut ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
  ids.sort_unstable();
  ids.dedup();

  // Every product of the order is locked up front, in id order, so two
  // orders sharing products can neither interleave nor deadlock.
  let mut current: HashMap<ProductId, Product> = tx
    .lock_products(&ids)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  let mut purchased = Vec::with_capacity(lines.len());
  for (line_index, request) in lines.iter().enumerate() {
    let available = match current.get(&request.product_id) {
      Some(product) => product.stock,
      None => {
        warn!(line_index, product_id = request.product_id, "Order references unknown product.");
        return Err(StockroomError::ProductNotFound {
          product_id: request.product_id,
        });
      }
    };

    if available < request.quantity {
      warn!(
        line_index,
        product_id = request.product_id,
        requested = request.quantity,
        available,
        "Insufficient stock."
      );
      return Err(StockroomError::InsufficientStock {
        product_id: request.product_id,
        requested: request.quantity,
        available,
      });
    }

    let updated = tx
      .take_stock(request.product_id, request.quantity, now)
      .await?
      .ok_or(StockroomError::InsufficientStock {
        product_id: request.product_id,
        requested: request.quantity,
        available,
      })?;
    event!(
      Level::DEBUG,
      line_index,
      product_id = updated.id,
      stock = updated.stock,
      sold = updated.sold,
      "Stock taken."
    );

    // Later lines for the same product see this line's movement.
    current.insert(updated.id, updated.clone());
    purchased.push(OrderLine {
      product: updated,
      quantity: request.quantity,
    });
  }

  let header = tx.insert_order(now).await?;
  for line in &purchased {
    tx.insert_line(header.id, line.product_id(), line.quantity, now).await?;
  }

  Ok(Order::from_parts(header, purchased))
}

/// Deletes an order together with all of its lines and returns it as it was
/// before deletion. Stock taken by the order is not given back.
#[instrument(name = "orders::delete_order", skip(store), err(Display))]
pub async fn delete_order<S>(store: &S, order_id: OrderId) -> StockroomResult<Order>
where
  S: OrderStore + ?Sized,
{
  let mut tx = store.begin().await?;
  let outcome = remove(tx.as_mut(), order_id).await;
  match outcome {
    Ok(order) => {
      tx.commit().await?;
      info!(order_id, lines = order.products.len(), "Order deleted.");
      Ok(order)
    }
    Err(e) => abort(tx, e).await,
  }
}

async fn remove(tx: &mut dyn StockTransaction, order_id: OrderId) -> StockroomResult<Order> {
  let header = tx
    .lock_order(order_id)
    .await?
    .ok_or(StockroomError::OrderNotFound { order_id })?;
  let lines = tx.order_lines(order_id).await?;
  tx.delete_order(order_id).await?;
  Ok(Order::from_parts(header, lines))
}

/// Rolls back and surfaces the error that caused it. A failed rollback is only
/// logged: the backend discards the transaction anyway once it is dropped.
async fn abort<T>(tx: Box<dyn StockTransaction>, err: StockroomError) -> StockroomResult<T> {
  if let Err(rollback_err) = tx.rollback().await {
    warn!(error = %rollback_err, cause = %err, "Rollback failed.");
  }
  Err(err)
}
