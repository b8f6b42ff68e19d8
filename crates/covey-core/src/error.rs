//! Error types shared by every capability implementation.

use thiserror::Error;

use crate::tool::ArgType;

/// Errors raised while invoking a tool.
///
/// `MissingArgument` and `InvalidArgumentType` are produced by schema
/// validation before the tool body runs; `ExecutionFailed` comes from the
/// tool body itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    /// A required argument was not supplied.
    #[error("Missing required argument: {name}")]
    MissingArgument { name: String },

    /// A supplied argument does not match its declared type.
    #[error("Argument {name} must be {}", expected.with_article())]
    InvalidArgumentType { name: String, expected: ArgType },

    /// The tool ran and failed.
    #[error("{0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Convenience constructor for tool bodies.
    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::ExecutionFailed(message.into())
    }

    /// Whether the error was raised by argument validation.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            ToolError::MissingArgument { .. } | ToolError::InvalidArgumentType { .. }
        )
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            ToolError::MissingArgument { .. } => "TOOL_MISSING_ARGUMENT",
            ToolError::InvalidArgumentType { .. } => "TOOL_INVALID_ARGUMENT_TYPE",
            ToolError::ExecutionFailed(_) => "TOOL_EXECUTION_FAILED",
        }
    }
}

/// Errors raised by a [`Model`](crate::Model) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The backend accepted the request but failed to produce text.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The backend could not be reached or started.
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    /// Generation was aborted by the caller.
    #[error("Generation cancelled")]
    Cancelled,
}

impl ModelError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::Generation(_) => "MODEL_GENERATION_FAILED",
            ModelError::Unavailable(_) => "MODEL_UNAVAILABLE",
            ModelError::Cancelled => "MODEL_CANCELLED",
        }
    }
}
