// tests/concurrency_tests.rs
mod common;

use common::*;
use stockroom::{LineRequest, StockroomError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_orders_for_the_last_units_do_not_oversell() {
  setup_tracing();
  let (room, p) = seeded(&[("Limited print", 50_000, 5)]).await;
  let id = p[0].id;

  // Each order fits on its own; together they exceed the stock.
  let first = tokio::spawn({
    let room = room.clone();
    async move { room.create_order(&[LineRequest::new(id, 5)]).await }
  });
  let second = tokio::spawn({
    let room = room.clone();
    async move { room.create_order(&[LineRequest::new(id, 5)]).await }
  });
  let results = [first.await.unwrap(), second.await.unwrap()];

  let succeeded = results.iter().filter(|r| r.is_ok()).count();
  let short = results
    .iter()
    .filter(|r| matches!(r, Err(StockroomError::InsufficientStock { .. })))
    .count();
  assert_eq!(succeeded, 1);
  assert_eq!(short, 1);
  assert_eq!(counters(&room, id).await, (0, 5));
  assert_eq!(room.list_orders().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_small_orders_sell_exactly_the_stock() {
  setup_tracing();
  let (room, p) = seeded(&[("Sticker", 100, 10)]).await;
  let id = p[0].id;

  let handles: Vec<_> = (0..25)
    .map(|_| {
      let room = room.clone();
      tokio::spawn(async move { room.create_order(&[LineRequest::new(id, 1)]).await })
    })
    .collect();

  let mut succeeded = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => succeeded += 1,
      Err(StockroomError::InsufficientStock { .. }) => {}
      Err(other) => panic!("Unexpected error: {:?}", other),
    }
  }

  assert_eq!(succeeded, 10);
  assert_eq!(counters(&room, id).await, (0, 10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_orders_locking_products_in_opposite_order_both_finish() {
  setup_tracing();
  let (room, p) = seeded(&[("Left", 10, 100), ("Right", 10, 100)]).await;
  let (a, b) = (p[0].id, p[1].id);

  let handles: Vec<_> = (0..20)
    .map(|i| {
      let room = room.clone();
      let lines = if i % 2 == 0 {
        vec![LineRequest::new(a, 1), LineRequest::new(b, 1)]
      } else {
        vec![LineRequest::new(b, 1), LineRequest::new(a, 1)]
      };
      tokio::spawn(async move { room.create_order(&lines).await })
    })
    .collect();

  for handle in handles {
    handle.await.unwrap().unwrap();
  }
  assert_eq!(counters(&room, a).await, (80, 20));
  assert_eq!(counters(&room, b).await, (80, 20));
  assert_eq!(room.list_orders().await.unwrap().len(), 20);
}
