//! Task registry with dependency gating and a priority-ordered ready queue.

use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::error::{TeamError, TeamResult};
use crate::task::{NewTask, Task, TaskId, TaskStatus};

/// All tasks of a team plus the queue of tasks ready to run.
///
/// A task is ready once every dependency is Completed. With prioritization
/// enabled a ready task is queued in front of the first queued task with a
/// strictly lower priority, so equal priorities stay first-in first-out;
/// otherwise the queue is plain FIFO.
///
/// The graph itself is not synchronized; teams keep it behind a mutex.
#[derive(Debug)]
pub struct TaskGraph {
    tasks: HashMap<TaskId, Task>,
    ready: VecDeque<TaskId>,
    next_id: u64,
    prioritize: bool,
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TaskGraph {
    pub fn new(prioritize: bool) -> Self {
        Self {
            tasks: HashMap::new(),
            ready: VecDeque::new(),
            next_id: 1,
            prioritize,
        }
    }

    /// Store a new task and queue it if it is already ready.
    pub fn create(&mut self, request: NewTask) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;

        let task = Task::from_request(id, request);
        let ready = self.dependencies_met(&task);
        debug!(task_id = %id, priority = task.priority, ready, "Task created");
        self.tasks.insert(id, task);
        if ready {
            self.enqueue(id);
        }
        id
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Ready task ids in dequeue order.
    pub fn ready_ids(&self) -> Vec<TaskId> {
        self.ready.iter().copied().collect()
    }

    /// Take the next ready task off the queue.
    pub fn pop_ready(&mut self) -> Option<TaskId> {
        self.ready.pop_front()
    }

    pub fn is_ready(&self, id: &TaskId) -> bool {
        self.ready.contains(id)
    }

    /// Pending to InProgress.
    pub fn mark_started(&mut self, id: &TaskId) -> TeamResult<()> {
        let task = self.task_mut(id)?;
        if task.status != TaskStatus::Pending {
            return Err(TeamError::InvalidTransition {
                id: *id,
                from: task.status,
                to: TaskStatus::InProgress,
            });
        }
        task.status = TaskStatus::InProgress;
        task.started_at = Some(Utc::now());
        self.dequeue(id);
        Ok(())
    }

    /// Record success and queue dependents that just became ready.
    ///
    /// Returns the newly ready ids in the order they were queued.
    pub fn mark_completed(
        &mut self,
        id: &TaskId,
        result: impl Into<String>,
    ) -> TeamResult<Vec<TaskId>> {
        let task = self.task_mut(id)?;
        task.status = TaskStatus::Completed;
        task.result = Some(result.into());
        task.completed_at = Some(Utc::now());
        self.dequeue(id);

        let mut newly_ready: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending && t.dependencies.contains(id))
            .filter(|t| self.dependencies_met(t))
            .map(|t| t.id)
            .filter(|dep| !self.ready.contains(dep))
            .collect();
        newly_ready.sort();

        for ready in &newly_ready {
            debug!(task_id = %ready, after = %id, "Dependencies satisfied");
            self.enqueue(*ready);
        }
        Ok(newly_ready)
    }

    /// Record failure. The error text is also stored as the result.
    ///
    /// Dependents of a failed task never become ready.
    pub fn mark_failed(&mut self, id: &TaskId, error: impl Into<String>) -> TeamResult<()> {
        let error = error.into();
        let task = self.task_mut(id)?;
        task.status = TaskStatus::Failed;
        task.result = Some(error.clone());
        task.error = Some(error);
        task.completed_at = Some(Utc::now());
        self.dequeue(id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks ordered by id.
    pub fn tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    fn task_mut(&mut self, id: &TaskId) -> TeamResult<&mut Task> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or(TeamError::TaskNotFound(*id))?;
        if task.status.is_terminal() {
            return Err(TeamError::TaskFinished {
                id: *id,
                status: task.status,
            });
        }
        Ok(task)
    }

    fn dependencies_met(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|dep| {
            self.tasks
                .get(dep)
                .is_some_and(|d| d.status == TaskStatus::Completed)
        })
    }

    fn enqueue(&mut self, id: TaskId) {
        if !self.prioritize {
            self.ready.push_back(id);
            return;
        }

        let priority = self.tasks.get(&id).map_or(i32::MIN, |t| t.priority);
        let slot = self.ready.iter().position(|queued| {
            self.tasks
                .get(queued)
                .is_some_and(|t| t.priority < priority)
        });
        match slot {
            Some(idx) => self.ready.insert(idx, id),
            None => self.ready.push_back(id),
        }
    }

    fn dequeue(&mut self, id: &TaskId) {
        self.ready.retain(|queued| queued != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn drain(graph: &mut TaskGraph) -> Vec<i32> {
        let mut order = Vec::new();
        while let Some(id) = graph.pop_ready() {
            order.push(graph.get(&id).unwrap().priority);
        }
        order
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut graph = TaskGraph::default();
        let a = graph.create(NewTask::new("a"));
        let b = graph.create(NewTask::new("b"));
        assert_eq!(a.to_string(), "task_1");
        assert_eq!(b.to_string(), "task_2");
        assert_eq!(graph.get(&a).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn test_priority_insertion() {
        let mut graph = TaskGraph::new(true);
        for p in [1, 5, 3] {
            graph.create(NewTask::new("t").priority(p));
        }
        assert_eq!(drain(&mut graph), vec![5, 3, 1]);
    }

    #[test]
    fn test_equal_priorities_stay_fifo() {
        let mut graph = TaskGraph::new(true);
        let first = graph.create(NewTask::new("first").priority(2));
        let second = graph.create(NewTask::new("second").priority(2));
        let urgent = graph.create(NewTask::new("urgent").priority(3));
        assert_eq!(graph.ready_ids(), vec![urgent, first, second]);
    }

    #[test]
    fn test_fifo_without_prioritization() {
        let mut graph = TaskGraph::new(false);
        for p in [1, 5, 3] {
            graph.create(NewTask::new("t").priority(p));
        }
        assert_eq!(drain(&mut graph), vec![1, 5, 3]);
    }

    #[test]
    fn test_dependencies_gate_readiness() {
        let mut graph = TaskGraph::default();
        let a = graph.create(NewTask::new("a"));
        let b = graph.create(NewTask::new("b"));
        let c = graph.create(NewTask::new("c").dependencies([a, b]));
        assert!(!graph.is_ready(&c));

        assert!(graph.mark_completed(&a, "done").unwrap().is_empty());
        assert!(!graph.is_ready(&c));

        assert_eq!(graph.mark_completed(&b, "done").unwrap(), vec![c]);
        assert_eq!(graph.ready_ids(), vec![c]);
    }

    #[test]
    fn test_task_with_completed_dependency_is_ready_at_creation() {
        let mut graph = TaskGraph::default();
        let a = graph.create(NewTask::new("a"));
        graph.mark_completed(&a, "ok").unwrap();
        let b = graph.create(NewTask::new("b").depends_on(a));
        assert!(graph.is_ready(&b));
    }

    #[test]
    fn test_failed_dependency_blocks_dependents() {
        let mut graph = TaskGraph::default();
        let a = graph.create(NewTask::new("a"));
        let b = graph.create(NewTask::new("b").depends_on(a));
        graph.mark_failed(&a, "boom").unwrap();

        let failed = graph.get(&a).unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.result.as_deref(), Some("boom"));
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(!graph.is_ready(&b));
    }

    #[test]
    fn test_lifecycle_timestamps() {
        let mut graph = TaskGraph::default();
        let a = graph.create(NewTask::new("a"));
        graph.mark_started(&a).unwrap();
        assert!(!graph.is_ready(&a));

        let task = graph.get(&a).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.started_at.is_some());

        graph.mark_completed(&a, "ok").unwrap();
        let task = graph.get(&a).unwrap();
        assert!(task.completed_at.unwrap() >= task.started_at.unwrap());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut graph = TaskGraph::default();
        let a = graph.create(NewTask::new("a"));
        graph.mark_completed(&a, "ok").unwrap();

        assert_eq!(
            graph.mark_failed(&a, "late"),
            Err(TeamError::TaskFinished {
                id: a,
                status: TaskStatus::Completed
            })
        );
        assert!(graph.mark_started(&a).is_err());
        assert!(graph.mark_completed(&a, "again").is_err());
        assert_eq!(graph.get(&a).unwrap().result.as_deref(), Some("ok"));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut graph = TaskGraph::default();
        let a = graph.create(NewTask::new("a"));
        graph.mark_started(&a).unwrap();
        assert!(matches!(
            graph.mark_started(&a),
            Err(TeamError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_unknown_task() {
        let mut graph = TaskGraph::default();
        let missing = TaskId::new(99);
        assert_eq!(
            graph.mark_started(&missing),
            Err(TeamError::TaskNotFound(missing))
        );
    }

    proptest! {
        #[test]
        fn prop_ready_queue_is_sorted_and_stable(priorities in proptest::collection::vec(-5i32..5, 0..40)) {
            let mut graph = TaskGraph::new(true);
            let ids: Vec<TaskId> = priorities
                .iter()
                .map(|p| graph.create(NewTask::new("t").priority(*p)))
                .collect();

            let mut expected: Vec<(i32, TaskId)> =
                priorities.iter().copied().zip(ids.iter().copied()).collect();
            // stable sort keeps creation order among equal priorities
            expected.sort_by(|a, b| b.0.cmp(&a.0));
            let expected: Vec<TaskId> = expected.into_iter().map(|(_, id)| id).collect();

            prop_assert_eq!(graph.ready_ids(), expected);
        }

        #[test]
        fn prop_ids_strictly_increase(count in 1usize..50) {
            let mut graph = TaskGraph::default();
            let ids: Vec<TaskId> = (0..count).map(|_| graph.create(NewTask::new("t"))).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
