//! # Covey Core
//!
//! Capability traits and shared types for the Covey agent team runtime.
//!
//! Agents in Covey never talk to a concrete language model, tool or memory
//! store directly. They consume three capabilities:
//!
//! - [`Model`] - turns a prompt into text
//! - [`Tool`] - a named callable with a declared argument schema
//! - [`Memory`] - supplies prior context and records new facts
//!
//! Everything else (the reasoning loop, the task graph, the collaboration
//! strategies) lives in the higher-level crates and is written against these
//! traits only.

pub mod error;
pub mod memory;
pub mod model;
pub mod tool;

pub use error::{ModelError, ToolError};
pub use memory::{Memory, NoMemory};
pub use model::{GenerationOptions, Model};
pub use tool::{ArgSpec, ArgType, ArgsSchema, Tool, ToolArgs, render_tool_output};
