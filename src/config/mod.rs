//! # Configuration Management
//!
//! Environment-driven configuration for the certforge service.

mod settings;

pub use settings::{AppConfig, DatabaseConfig, ObservabilityConfig, ServerConfig};
