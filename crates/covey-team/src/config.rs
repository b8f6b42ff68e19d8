//! Team configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a team splits work between its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaborationMode {
    /// Each agent continues the previous agent's work.
    #[default]
    Sequential,
    /// The coordinator plans steps that run concurrently once their
    /// dependencies have finished.
    Parallel,
    /// The coordinator delegates steps one by one and synthesizes the results.
    Hierarchical,
    /// Everyone answers independently and the coordinator merges the answers.
    Consensus,
}

impl CollaborationMode {
    pub const ALL: [CollaborationMode; 4] = [
        CollaborationMode::Sequential,
        CollaborationMode::Parallel,
        CollaborationMode::Hierarchical,
        CollaborationMode::Consensus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationMode::Sequential => "sequential",
            CollaborationMode::Parallel => "parallel",
            CollaborationMode::Hierarchical => "hierarchical",
            CollaborationMode::Consensus => "consensus",
        }
    }
}

impl fmt::Display for CollaborationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollaborationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown collaboration mode '{s}' (expected sequential, parallel, hierarchical or consensus)")
            })
    }
}

/// Settings shared by every run of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    pub collaboration_mode: CollaborationMode,
    /// Upper bound on concurrently running plan steps. Zero is treated as one.
    pub max_parallel_tasks: usize,
    pub enable_task_prioritization: bool,
    pub enable_performance_tracking: bool,
    /// Allows [`Team::run_async`](crate::Team::run_async).
    pub enable_async_execution: bool,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            collaboration_mode: CollaborationMode::Sequential,
            max_parallel_tasks: 4,
            enable_task_prioritization: true,
            enable_performance_tracking: true,
            enable_async_execution: true,
        }
    }
}

impl TeamConfig {
    pub fn with_mode(mut self, mode: CollaborationMode) -> Self {
        self.collaboration_mode = mode;
        self
    }

    pub fn with_max_parallel_tasks(mut self, limit: usize) -> Self {
        self.max_parallel_tasks = limit;
        self
    }

    pub fn with_performance_tracking(mut self, enabled: bool) -> Self {
        self.enable_performance_tracking = enabled;
        self
    }

    pub fn with_task_prioritization(mut self, enabled: bool) -> Self {
        self.enable_task_prioritization = enabled;
        self
    }

    pub fn with_async_execution(mut self, enabled: bool) -> Self {
        self.enable_async_execution = enabled;
        self
    }
}
