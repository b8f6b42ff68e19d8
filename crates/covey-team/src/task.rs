//! Task records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const TASK_ID_PREFIX: &str = "task_";

/// Identifier of a task, rendered as `task_<n>`.
///
/// Ids are allocated from a counter owned by the task graph, so ordering by
/// id is creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn number(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TASK_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(TASK_ID_PREFIX)
            .and_then(|n| n.parse().ok())
            .map(TaskId)
            .ok_or_else(|| format!("invalid task id: {s}"))
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Completed and Failed are never left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work tracked by a team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub assigned_agent: Option<String>,
    /// Higher is more urgent.
    pub priority: i32,
    pub dependencies: Vec<TaskId>,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub(crate) fn from_request(id: TaskId, request: NewTask) -> Self {
        Self {
            id,
            description: request.description,
            assigned_agent: request.assigned_agent,
            priority: request.priority,
            dependencies: request.dependencies,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}

/// Parameters for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub assigned_agent: Option<String>,
    pub priority: i32,
    pub dependencies: Vec<TaskId>,
}

impl NewTask {
    pub const DEFAULT_PRIORITY: i32 = 1;

    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            assigned_agent: None,
            priority: Self::DEFAULT_PRIORITY,
            dependencies: Vec::new(),
        }
    }

    pub fn assigned_to(mut self, agent: impl Into<String>) -> Self {
        self.assigned_agent = Some(agent.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on(mut self, id: TaskId) -> Self {
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self
    }

    pub fn dependencies(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        for id in ids {
            self = self.depends_on(id);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_format() {
        let id = TaskId::new(12);
        assert_eq!(id.to_string(), "task_12");
        assert_eq!("task_12".parse::<TaskId>(), Ok(id));
        assert!("job_12".parse::<TaskId>().is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"task_12\"");
    }

    #[test]
    fn test_new_task_defaults() {
        let request = NewTask::new("write report");
        assert_eq!(request.priority, 1);
        assert!(request.dependencies.is_empty());
        assert!(request.assigned_agent.is_none());
    }

    #[test]
    fn test_dependencies_are_a_set() {
        let a = TaskId::new(1);
        let request = NewTask::new("x").depends_on(a).dependencies([a, TaskId::new(2)]);
        assert_eq!(request.dependencies, vec![a, TaskId::new(2)]);
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }
}
