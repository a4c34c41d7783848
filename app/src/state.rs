// stockroom_app/src/state.rs
use crate::config::AppConfig;
use std::sync::Arc;
use stockroom::Stockroom;

#[derive(Clone)]
pub struct AppState {
  pub stockroom: Stockroom,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(stockroom: Stockroom, config: Arc<AppConfig>) -> Self {
    Self { stockroom, config }
  }
}
