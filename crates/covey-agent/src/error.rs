//! Error types for the reasoning loop.

use covey_core::ModelError;
use thiserror::Error;

/// Errors that end an agent run early.
///
/// Tool failures, unknown tools and unparseable replies are fed back into
/// the conversation instead, and exhausting the iteration budget yields a
/// normal answer, so only these two conditions escape [`Agent::run`].
///
/// [`Agent::run`]: crate::Agent::run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// The model backend failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The run was cancelled through its token.
    #[error("Agent run cancelled")]
    Cancelled,
}

impl AgentError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            AgentError::Model(err) => err.error_code(),
            AgentError::Cancelled => "AGENT_CANCELLED",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AgentError::Cancelled | AgentError::Model(ModelError::Cancelled)
        )
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
