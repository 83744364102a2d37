//! # Error Handling
//!
//! This module provides error handling for the certforge service.
//! It defines custom error types using `thiserror`.

mod types;

pub use types::{CertforgeError, Result};
