//! # Covey Agent
//!
//! A single agent's reasoning loop.
//!
//! An [`Agent`] answers a task by repeatedly rendering its [`Conversation`]
//! into a prompt, asking its model for the next step and acting on the
//! reply:
//!
//! - `Action:` / `Action Input:` runs a tool and feeds the result back
//! - `Final Answer:` ends the run
//! - anything else earns a reminder of the expected format
//!
//! The loop is bounded by `max_iterations`; running out yields
//! [`ITERATION_LIMIT_MESSAGE`] rather than an error.
//!
//! Teams talk to agents through the [`Coworker`] trait.

pub mod agent;
pub mod conversation;
pub mod coworker;
pub mod error;
pub mod parser;

pub use agent::{
    Agent, AgentBuilder, AgentRun, DEFAULT_MAX_ITERATIONS, FORMAT_REMINDER,
    ITERATION_LIMIT_MESSAGE, RunOutcome, ToolCallRecord,
};
pub use conversation::{Conversation, Message, Role};
pub use coworker::Coworker;
pub use error::{AgentError, AgentResult};
pub use parser::ModelReply;
