//! # Covey Team
//!
//! Teams of agents working on one task together.
//!
//! A [`Team`] owns a roster of [`Coworker`]s, a [`TaskGraph`] of tracked
//! tasks and a [`PerformanceTracker`]. [`Team::run`] hands the task to one
//! of four strategies selected by [`CollaborationMode`]:
//!
//! | Mode | Flow |
//! |------|------|
//! | Sequential | coordinator answers, every other member refines the latest answer |
//! | Parallel | coordinator plans, steps run as soon as their dependencies finish |
//! | Hierarchical | coordinator plans, delegates step by step and synthesizes |
//! | Consensus | everyone answers, coordinator merges the answers |
//!
//! ```rust,no_run
//! use covey_team::{CollaborationMode, Team, TeamConfig};
//! # async fn demo(researcher: std::sync::Arc<dyn covey_agent::Coworker>) -> covey_team::TeamResult<()> {
//! let team = Team::new("research", "Answers research questions",
//!     TeamConfig::default().with_mode(CollaborationMode::Consensus))
//!     .with_agent(researcher);
//! let answer = team.run("Is Rust memory safe?", None).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod performance;
pub mod plan;
pub mod registry;
mod strategy;
pub mod task;
pub mod team;

pub use config::{CollaborationMode, TeamConfig};
pub use error::{PlanError, TeamError, TeamResult};
pub use graph::TaskGraph;
pub use performance::{PerformanceRecord, PerformanceTracker};
pub use plan::{Plan, PlanStep};
pub use registry::Registry;
pub use task::{NewTask, Task, TaskId, TaskStatus};
pub use team::{ASYNC_TASK_PRIORITY, CompletionCallback, EMPTY_TEAM_MESSAGE, Team};

pub use covey_agent::Coworker;
