//! # certforge
//!
//! certforge issues unique participation certificates identified by a
//! human-shareable code, persisting them durably when possible and
//! continuing to operate against a transient in-memory store when the
//! durable backend is unreachable.
//!
//! ## Architecture
//!
//! The system follows a layered architecture pattern:
//!
//! ```text
//! REST API Layer → Certificate Service → Active Record Store
//!      ↓                  ↓                      ↓
//! Validation      Identifier Generator    Backend Health Monitor
//! ```
//!
//! ## Core Components
//!
//! - **REST API Adapter**: Axum-based HTTP surface for generation,
//!   download, statistics and health
//! - **Certificate Service**: Orchestrates issuance, idempotent replay and
//!   download accounting
//! - **Record Stores**: A durable SQLite store and an in-memory fallback
//!   behind one contract
//! - **Backend Health Monitor**: Drives failover routing between the two
//!   stores
//!
//! Records written while failed over to the in-memory store are not
//! replayed into the durable store on reconnection; the two data sets are
//! independent by design.

pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod startup;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{CertforgeError, Result};
pub use observability::init_tracing;
pub use startup::{build_application, Application};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
