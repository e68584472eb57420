//! Error types for the compliance checker.
//!
//! All errors are explicitly typed using thiserror. No panics in production code.
//! Matching itself never fails; these errors come from the data-access layer,
//! configuration, and the HTTP surface.

use thiserror::Error;

/// Central error type for all compliance operations.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// Configuration error (missing env vars, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request to the hosted store failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The hosted store answered with a non-success status.
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream {
        /// HTTP status code returned by the store.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Content filter term failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Internal state error (lock poisoning, cache loader failure).
    #[error("Internal state error: {0}")]
    InternalState(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Rejected query at the HTTP surface.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl ComplianceError {
    /// Log error with full context using tracing.
    pub fn log_with_context(&self, context: &ErrorContext) {
        match self {
            Self::InternalState(_) | Self::Io(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    "Critical error occurred"
                );
            }
            Self::Http(_) | Self::Upstream { .. } => {
                tracing::warn!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    list = ?context.list,
                    "Data store unavailable"
                );
            }
            Self::Config(_) | Self::InvalidPattern(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    "Configuration error"
                );
            }
            Self::Json(_) => {
                tracing::warn!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    list = ?context.list,
                    "Malformed data from store"
                );
            }
            Self::InvalidQuery(_) => {
                tracing::debug!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    "Rejected query"
                );
            }
        }
    }

    /// Get user-friendly error message (hides internal details).
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "Service configuration error",
            Self::Http(_) | Self::Upstream { .. } => "Database service temporarily unavailable",
            Self::Json(_) => "Data format error",
            Self::InvalidPattern(_) => "Invalid filter configuration",
            Self::InternalState(_) => "Internal service error",
            Self::Io(_) => "File system error",
            Self::InvalidQuery(_) => "Please provide a search query",
        }
    }
}

/// Context information for error logging.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Unique request identifier for correlation.
    pub request_id: String,
    /// Operation being performed.
    pub operation: String,
    /// Name of the list being fetched, if any.
    pub list: Option<&'static str>,
}

impl ErrorContext {
    /// Create a new error context.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            list: None,
        }
    }

    /// Set the list name.
    pub fn with_list(mut self, list: &'static str) -> Self {
        self.list = Some(list);
        self
    }
}

/// Result type alias for compliance operations.
pub type Result<T> = std::result::Result<T, ComplianceError>;
