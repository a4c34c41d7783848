// stockroom_app/src/lib.rs

//! HTTP surface of the stockroom service: configuration, error mapping,
//! routes and handlers, database bootstrap.

pub mod config;
pub mod db;
pub mod errors;
pub mod state;
pub mod web;

pub use crate::config::{AppConfig, LogFormat};
pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;
