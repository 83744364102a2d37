//! # Error Types
//!
//! Error types for the certforge certificate service using `thiserror`.

/// Custom result type for certforge operations
pub type Result<T> = std::result::Result<T, CertforgeError>;

/// Main error type for the certforge service
#[derive(thiserror::Error, Debug)]
pub enum CertforgeError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors (malformed name or email, never reaches the store)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound {
        resource_type: String,
        id: String,
    },

    /// Resource conflict errors (uniqueness violation on insert)
    #[error("Resource conflict: {message}")]
    Conflict {
        message: String,
        resource_type: String,
    },

    /// Durable backend unreachable at call time
    #[error("Backend unavailable: {context}")]
    BackendUnavailable {
        context: String,
    },

    /// Defensive cap on reference id draws reached
    #[error("Reference id generation exhausted after {attempts} attempts")]
    GenerationExhausted {
        attempts: usize,
    },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CertforgeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a conflict error
    pub fn conflict<M: Into<String>, R: Into<String>>(message: M, resource_type: R) -> Self {
        Self::Conflict { message: message.into(), resource_type: resource_type.into() }
    }

    /// Create a backend unavailable error
    pub fn backend_unavailable<S: Into<String>>(context: S) -> Self {
        Self::BackendUnavailable { context: context.into() }
    }

    /// Create a generation exhausted error
    pub fn generation_exhausted(attempts: usize) -> Self {
        Self::GenerationExhausted { attempts }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CertforgeError::Config { .. } => 500,
            CertforgeError::Database { .. } => 500,
            CertforgeError::Io { .. } => 500,
            CertforgeError::Serialization { .. } => 400,
            CertforgeError::Validation { .. } => 400,
            CertforgeError::NotFound { .. } => 404,
            CertforgeError::Conflict { .. } => 409,
            CertforgeError::BackendUnavailable { .. } => 503,
            CertforgeError::GenerationExhausted { .. } => 500,
            CertforgeError::Internal { .. } => 500,
        }
    }

    /// Check whether this error is a uniqueness conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, CertforgeError::Conflict { .. })
    }

    /// Check whether this error signals that the durable backend is
    /// unreachable and the operation should fail over to the fallback
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            CertforgeError::Database { .. } | CertforgeError::BackendUnavailable { .. }
        )
    }
}

// Error conversions for common external error types
impl From<sqlx::Error> for CertforgeError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<std::io::Error> for CertforgeError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for CertforgeError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for CertforgeError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
