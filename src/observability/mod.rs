//! # Observability Infrastructure
//!
//! Structured logging for the certforge service using the tracing
//! ecosystem.

pub mod logging;

pub use logging::{init_tracing, log_config_info};
