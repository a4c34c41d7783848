// stockroom/src/orders/aggregate.rs

//! Rebuilds orders from the orders ⋈ order_products ⋈ products join.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::error::{StockroomError, StockroomResult};
use crate::model::{Order, OrderId, OrderRow};
use crate::store::OrderStore;

/// Groups join rows by order id.
///
/// Orders keep the order in which their id first appears; lines keep the
/// order of the rows. A row without a line contributes the header only.
pub fn group_rows(rows: Vec<OrderRow>) -> Vec<Order> {
  let mut orders: Vec<Order> = Vec::new();
  let mut position: HashMap<OrderId, usize> = HashMap::new();

  for row in rows {
    let idx = *position.entry(row.header.id).or_insert_with(|| {
      orders.push(Order::from_parts(row.header.clone(), Vec::new()));
      orders.len() - 1
    });
    if let Some(line) = row.line {
      orders[idx].products.push(line);
    }
  }
  orders
}

#[instrument(name = "orders::list_orders", skip(store), err(Display))]
pub async fn list_orders<S>(store: &S) -> StockroomResult<Vec<Order>>
where
  S: OrderStore + ?Sized,
{
  let rows = store.order_rows().await?;
  let row_count = rows.len();
  let orders = group_rows(rows);
  debug!(rows = row_count, orders = orders.len(), "Aggregated orders.");
  Ok(orders)
}

/// One order with its lines. An existing order without lines comes back with
/// an empty product list rather than an error.
#[instrument(name = "orders::get_order", skip(store), err(Display))]
pub async fn get_order<S>(store: &S, order_id: OrderId) -> StockroomResult<Order>
where
  S: OrderStore + ?Sized,
{
  let header = store
    .order_header(order_id)
    .await?
    .ok_or(StockroomError::OrderNotFound { order_id })?;
  let lines = store.order_lines(order_id).await?;
  // The two reads are not one snapshot. No lines may mean the order was
  // deleted in between, so confirm the header is still there.
  if lines.is_empty() && store.order_header(order_id).await?.is_none() {
    debug!(order_id, "Order vanished between header and line reads.");
    return Err(StockroomError::OrderNotFound { order_id });
  }
  Ok(Order::from_parts(header, lines))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{OrderHeader, OrderLine, Product};
  use chrono::{TimeZone, Utc};

  fn header(id: OrderId) -> OrderHeader {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    OrderHeader {
      id,
      created_at: at,
      updated_at: at,
    }
  }

  fn line(product_id: i64, quantity: i64) -> OrderLine {
    let at = Utc.with_ymd_and_hms(2024, 4, 1, 8, 30, 0).unwrap();
    OrderLine {
      product: Product {
        id: product_id,
        name: format!("product-{}", product_id),
        price: 1000,
        stock: 10,
        sold: quantity,
        created_at: at,
        updated_at: at,
      },
      quantity,
    }
  }

  fn row(order_id: OrderId, line: Option<OrderLine>) -> OrderRow {
    OrderRow {
      header: header(order_id),
      line,
    }
  }

  #[test]
  fn rows_are_grouped_per_order_in_first_seen_order() {
    let rows = vec![
      row(1, Some(line(10, 2))),
      row(1, Some(line(11, 1))),
      row(2, Some(line(10, 5))),
      row(1, Some(line(12, 3))),
    ];
    let orders = group_rows(rows);
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, 1);
    assert_eq!(orders[0].line_quantities(), vec![(10, 2), (11, 1), (12, 3)]);
    assert_eq!(orders[1].id, 2);
    assert_eq!(orders[1].line_quantities(), vec![(10, 5)]);
  }

  #[test]
  fn header_only_rows_yield_empty_orders() {
    let orders = group_rows(vec![row(3, None), row(4, Some(line(1, 1)))]);
    assert_eq!(orders.len(), 2);
    assert!(orders[0].products.is_empty());
    assert_eq!(orders[1].products.len(), 1);
  }

  #[test]
  fn no_rows_no_orders() {
    assert!(group_rows(Vec::new()).is_empty());
  }
}
