// tests/postgres_tests.rs
//
// Runs `PgStore` against a real server. Ignored by default:
//   DATABASE_URL=postgres://... cargo test -p stockroom --test postgres_tests -- --ignored
// Each test works in a schema of its own and drops it when it passes.
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::*;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use stockroom::store::postgres::SCHEMA;
use stockroom::{LineRequest, PgStore, ProductInput, Stockroom, StockroomError};

static NEXT_SCHEMA: AtomicUsize = AtomicUsize::new(0);

struct PgFixture {
  room: Stockroom,
  admin: PgPool,
  schema: String,
}

impl PgFixture {
  async fn new() -> Self {
    setup_tracing();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a disposable database");
    let schema = format!(
      "stockroom_test_{}_{}",
      std::process::id(),
      NEXT_SCHEMA.fetch_add(1, Ordering::SeqCst)
    );

    let admin = PgPool::connect(&url).await.unwrap();
    let reset = format!("DROP SCHEMA IF EXISTS {0} CASCADE; CREATE SCHEMA {0}", schema);
    sqlx::raw_sql(&reset).execute(&admin).await.unwrap();

    let search_path = format!("SET search_path TO {}", schema);
    let pool = PgPoolOptions::new()
      .max_connections(4)
      .after_connect(move |conn, _meta| {
        let search_path = search_path.clone();
        Box::pin(async move {
          conn.execute(search_path.as_str()).await?;
          Ok(())
        })
      })
      .connect(&url)
      .await
      .unwrap();
    sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();

    let store = PgStore::new(pool).with_statement_timeout(Duration::from_secs(5));
    Self {
      room: Stockroom::new(Arc::new(store)),
      admin,
      schema,
    }
  }

  async fn product(&self, name: &str, price: i64, stock: i64) -> i64 {
    self
      .room
      .create_product(&ProductInput::new(name, price, stock))
      .await
      .unwrap()
      .id
  }

  async fn order_line_count(&self) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}.order_products", self.schema))
      .fetch_one(&self.admin)
      .await
      .unwrap()
  }

  async fn teardown(self) {
    self
      .admin
      .execute(format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema).as_str())
      .await
      .unwrap();
  }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_pg_order_moves_stock_to_sold() {
  let pg = PgFixture::new().await;
  let id = pg.product("Keyboard", 45_000, 10).await;

  let order = pg.room.create_order(&[LineRequest::new(id, 4)]).await.unwrap();
  assert_eq!(order.line_quantities(), vec![(id, 4)]);
  assert_eq!(order.products[0].product.stock, 6);
  assert_eq!(counters(&pg.room, id).await, (6, 4));

  let fetched = pg.room.order(order.id).await.unwrap();
  assert_eq!(fetched.line_quantities(), vec![(id, 4)]);
  assert_eq!(pg.room.list_orders().await.unwrap().len(), 1);
  pg.teardown().await;
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_pg_failed_line_rolls_back_earlier_lines() {
  let pg = PgFixture::new().await;
  let cable = pg.product("Cable", 700, 10).await;
  let hub = pg.product("Hub", 2_500, 1).await;

  let result = pg
    .room
    .create_order(&[LineRequest::new(cable, 3), LineRequest::new(hub, 2)])
    .await;
  assert!(matches!(
    result,
    Err(StockroomError::InsufficientStock { product_id, .. }) if product_id == hub
  ));

  let result = pg
    .room
    .create_order(&[LineRequest::new(cable, 3), LineRequest::new(hub + 1_000, 1)])
    .await;
  assert!(matches!(result, Err(StockroomError::ProductNotFound { .. })));

  assert_eq!(counters(&pg.room, cable).await, (10, 0));
  assert_eq!(counters(&pg.room, hub).await, (1, 0));
  assert!(pg.room.list_orders().await.unwrap().is_empty());
  assert_eq!(pg.order_line_count().await, 0);
  pg.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs DATABASE_URL"]
async fn test_pg_two_orders_for_the_last_units_do_not_oversell() {
  let pg = PgFixture::new().await;
  let id = pg.product("Limited print", 50_000, 5).await;

  let first = tokio::spawn({
    let room = pg.room.clone();
    async move { room.create_order(&[LineRequest::new(id, 5)]).await }
  });
  let second = tokio::spawn({
    let room = pg.room.clone();
    async move { room.create_order(&[LineRequest::new(id, 5)]).await }
  });
  let results = [first.await.unwrap(), second.await.unwrap()];

  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  assert_eq!(
    results
      .iter()
      .filter(|r| matches!(r, Err(StockroomError::InsufficientStock { .. })))
      .count(),
    1
  );
  assert_eq!(counters(&pg.room, id).await, (0, 5));
  pg.teardown().await;
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_pg_delete_order_and_product_in_use() {
  let pg = PgFixture::new().await;
  let jam = pg.product("Jam", 350, 10).await;
  let order = pg.room.create_order(&[LineRequest::new(jam, 2)]).await.unwrap();

  assert!(matches!(
    pg.room.delete_product(jam).await,
    Err(StockroomError::ProductInUse { product_id }) if product_id == jam
  ));

  let deleted = pg.room.delete_order(order.id).await.unwrap();
  assert_eq!(deleted.line_quantities(), vec![(jam, 2)]);
  assert_eq!(pg.order_line_count().await, 0);
  assert!(matches!(pg.room.order(order.id).await, Err(StockroomError::OrderNotFound { .. })));

  // Stock stays sold; the product is free to go now.
  assert_eq!(counters(&pg.room, jam).await, (8, 2));
  pg.room.delete_product(jam).await.unwrap();
  pg.teardown().await;
}
