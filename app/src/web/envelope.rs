// stockroom_app/src/web/envelope.rs

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

/// `{ "data": ..., "message": ... }`, the body of every response.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
  pub data: T,
  pub message: &'a str,
}

pub fn respond<T: Serialize>(status: StatusCode, data: T, message: &str) -> HttpResponse {
  HttpResponse::build(status).json(Envelope { data, message })
}

pub fn ok<T: Serialize>(data: T, message: &str) -> HttpResponse {
  respond(StatusCode::OK, data, message)
}
