//! # HTTP API
//!
//! Thin axum adapter over the certificate service. Handlers translate JSON
//! in and out of the service contract; no business logic lives here.

pub mod error;
pub mod handlers;
pub mod routes;

pub use routes::{build_router, ApiState};
