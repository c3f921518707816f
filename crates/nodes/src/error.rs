//! Node-level error type.

use thiserror::Error;

/// Errors returned while mapping or executing a single input item.
///
/// Every variant is local to one item. The engine decides, based on its
/// `continue_on_fail` setting, whether the error becomes an `{error}` record
/// for that item or aborts the rest of the batch. Nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The login call failed or returned a body without `tokens.access.token`.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No request mapping exists for this resource/operation pair.
    #[error("Unknown {resource} operation: {operation}")]
    UnknownOperation { resource: String, operation: String },

    /// A required parameter is missing, empty, or malformed.
    #[error("invalid parameter '{field}': {message}")]
    Validation { field: String, message: String },

    /// Network or HTTP failure from a resource call. Passed through as-is.
    #[error("{0}")]
    Transport(String),
}

impl NodeError {
    /// Shorthand for a [`NodeError::Validation`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// A required parameter that is absent or empty.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::validation(field, "a non-empty value is required")
    }

    /// Stable, lowercase name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::Validation { .. } => "validation",
            Self::Transport(_) => "transport",
        }
    }
}
