//! Error types for team orchestration.

use thiserror::Error;

use crate::task::{TaskId, TaskStatus};

/// Errors raised by team operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamError {
    /// No agent with this name is on the roster.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// No task with this id exists.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// The task already reached a terminal state.
    #[error("Task {id} is already {status}")]
    TaskFinished { id: TaskId, status: TaskStatus },

    /// The requested status change is not allowed from the current state.
    #[error("Task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// The run was cancelled.
    #[error("Team run cancelled")]
    Cancelled,

    /// Background runs are switched off in the team configuration.
    #[error("Asynchronous execution is disabled for team {0}")]
    AsyncDisabled(String),
}

impl TeamError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            TeamError::AgentNotFound(_) => "AGENT_NOT_FOUND",
            TeamError::TaskNotFound(_) => "TASK_NOT_FOUND",
            TeamError::TaskFinished { .. } => "TASK_FINISHED",
            TeamError::InvalidTransition { .. } => "INVALID_TASK_TRANSITION",
            TeamError::Cancelled => "TEAM_CANCELLED",
            TeamError::AsyncDisabled(_) => "ASYNC_DISABLED",
        }
    }
}

/// Result type for team operations.
pub type TeamResult<T> = Result<T, TeamError>;

/// Why a coordinator's plan could not be used.
///
/// These end a Parallel or Hierarchical run early; the run returns the
/// message prefixed with `"Error: "` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The response contains no `[ ... ]` span.
    #[error("Could not create a plan for the task. Coordinator's response: {response}")]
    NotFound { response: String },

    /// The span is not a valid plan.
    #[error("Could not parse the plan. Coordinator's response: {response}")]
    Invalid { reason: String, response: String },
}

impl PlanError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PlanError::NotFound { .. } => "PLAN_NOT_FOUND",
            PlanError::Invalid { .. } => "PLAN_INVALID",
        }
    }

    /// The coordinator output the plan was extracted from.
    pub fn response(&self) -> &str {
        match self {
            PlanError::NotFound { response } | PlanError::Invalid { response, .. } => response,
        }
    }
}
