//! # Covey
//!
//! A runtime for LLM-driven agents that can also work together as teams.
//!
//! This crate re-exports the workspace crates under one roof:
//!
//! - [`core`]: the `Model`, `Tool` and `Memory` capabilities
//! - [`tools`]: tool registry and the standard tools
//! - [`memory`]: rolling, recency-biased memory
//! - [`agent`]: the bounded reasoning loop
//! - [`team`]: tasks, collaboration strategies and the registry
//!
//! ```no_run
//! use covey::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo(model: Arc<dyn Model>) -> Result<(), TeamError> {
//! let analyst = Agent::builder("analyst", Arc::clone(&model))
//!     .tool(CalculatorTool::new())
//!     .build();
//! let writer = Agent::builder("writer", model).build();
//!
//! let team = Team::new("crew", "Numbers and prose", TeamConfig::default())
//!     .with_agent(Arc::new(analyst))
//!     .with_agent(Arc::new(writer));
//! let answer = team.run("Summarise 17 * 23", Some("analyst")).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub use covey_agent as agent;
pub use covey_core as core;
pub use covey_memory as memory;
pub use covey_team as team;
pub use covey_tools as tools;

pub mod prelude {
    pub use covey_agent::{Agent, AgentBuilder, AgentError, AgentResult, Coworker};
    pub use covey_core::{GenerationOptions, Memory, Model, ModelError, Tool, ToolArgs, ToolError};
    pub use covey_memory::{RollingMemory, RollingMemoryConfig};
    pub use covey_team::{
        CollaborationMode, NewTask, Registry, Team, TeamConfig, TeamError, TeamResult,
    };
    pub use covey_tools::{CalculatorTool, FunctionTool, ToolRegistry, standard_tools};
}
