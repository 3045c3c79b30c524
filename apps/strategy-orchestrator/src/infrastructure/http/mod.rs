//! HTTP/REST API adapter.
//!
//! Inbound adapter exposing submission, status, cancellation, audit and
//! dependency health over axum.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::*;
pub use response::*;
