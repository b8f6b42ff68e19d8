//! The team orchestrator.

use covey_agent::Coworker;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{CollaborationMode, TeamConfig};
use crate::error::{TeamError, TeamResult};
use crate::graph::TaskGraph;
use crate::performance::{PerformanceRecord, PerformanceTracker};
use crate::strategy::{self, StrategyContext};
use crate::task::{NewTask, Task, TaskId};

/// Returned by [`Team::run`] when the roster is empty.
pub const EMPTY_TEAM_MESSAGE: &str = "No agents available in the team.";

/// Priority of tasks created by [`Team::run_async`].
pub const ASYNC_TASK_PRIORITY: i32 = 2;

/// Receives the result of a successful background run.
pub type CompletionCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// A named group of agents working under one collaboration mode.
///
/// The roster, the task graph and the performance map are guarded
/// separately, and no lock is held while an agent is running.
pub struct Team {
    name: String,
    description: String,
    config: TeamConfig,
    roster: RwLock<Vec<Arc<dyn Coworker>>>,
    tasks: Mutex<TaskGraph>,
    performance: Arc<PerformanceTracker>,
    shutdown: CancellationToken,
    task_events: Notify,
}

impl Team {
    pub fn new(name: impl Into<String>, description: impl Into<String>, config: TeamConfig) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tasks: Mutex::new(TaskGraph::new(config.enable_task_prioritization)),
            performance: Arc::new(PerformanceTracker::new(config.enable_performance_tracking)),
            config,
            roster: RwLock::new(Vec::new()),
            shutdown: CancellationToken::new(),
            task_events: Notify::new(),
        }
    }

    /// Builder-style [`add_agent`](Self::add_agent).
    pub fn with_agent(self, agent: Arc<dyn Coworker>) -> Self {
        self.add_agent(agent);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn config(&self) -> &TeamConfig {
        &self.config
    }

    pub fn mode(&self) -> CollaborationMode {
        self.config.collaboration_mode
    }

    /// Add `agent` to the roster.
    ///
    /// An agent with the same name is replaced in place, keeping its roster
    /// position. Either way the agent starts with a fresh performance record.
    pub fn add_agent(&self, agent: Arc<dyn Coworker>) {
        let name = agent.name().to_string();
        {
            let mut roster = self.roster_mut();
            match roster.iter().position(|a| a.name() == name) {
                Some(idx) => {
                    warn!(team = %self.name, agent = %name, "Agent already on the team, replacing");
                    roster[idx] = agent;
                }
                None => roster.push(agent),
            }
        }
        self.performance.register(&name);
        info!(team = %self.name, agent = %name, "Agent joined team");
    }

    /// Take `name` off the roster and drop its performance record.
    pub fn remove_agent(&self, name: &str) -> TeamResult<Arc<dyn Coworker>> {
        let removed = {
            let mut roster = self.roster_mut();
            let idx = roster.iter().position(|a| a.name() == name).ok_or_else(|| {
                warn!(team = %self.name, agent = %name, "Agent is not on the team");
                TeamError::AgentNotFound(name.to_string())
            })?;
            roster.remove(idx)
        };
        self.performance.unregister(name);
        info!(team = %self.name, agent = %name, "Agent left team");
        Ok(removed)
    }

    pub fn agent(&self, name: &str) -> Option<Arc<dyn Coworker>> {
        self.roster().iter().find(|a| a.name() == name).cloned()
    }

    /// Member names in roster order.
    pub fn agent_names(&self) -> Vec<String> {
        self.roster().iter().map(|a| a.name().to_string()).collect()
    }

    pub fn member_count(&self) -> usize {
        self.roster().len()
    }

    pub fn create_task(&self, request: NewTask) -> TaskId {
        self.graph().create(request)
    }

    /// Snapshot of a task record.
    pub fn get_task(&self, id: &TaskId) -> Option<Task> {
        self.graph().get(id).cloned()
    }

    /// Snapshot of every task, ordered by id.
    pub fn tasks(&self) -> Vec<Task> {
        self.graph().tasks().into_iter().cloned().collect()
    }

    /// Ready task ids in the order they would be handed out.
    pub fn ready_tasks(&self) -> Vec<TaskId> {
        self.graph().ready_ids()
    }

    /// Claim the next ready task, moving it to InProgress.
    pub fn next_ready_task(&self) -> Option<Task> {
        let mut graph = self.graph();
        let id = graph.pop_ready()?;
        match graph.mark_started(&id) {
            Ok(()) => graph.get(&id).cloned(),
            Err(err) => {
                warn!(team = %self.name, task_id = %id, error = %err, "Queued task could not start");
                None
            }
        }
    }

    pub fn start_task(&self, id: &TaskId) -> TeamResult<()> {
        self.graph().mark_started(id)
    }

    /// Record a result. Returns the dependents that became ready.
    pub fn complete_task(&self, id: &TaskId, result: impl Into<String>) -> TeamResult<Vec<TaskId>> {
        let ready = self.graph().mark_completed(id, result)?;
        self.task_events.notify_waiters();
        Ok(ready)
    }

    pub fn fail_task(&self, id: &TaskId, error: impl Into<String>) -> TeamResult<()> {
        self.graph().mark_failed(id, error)?;
        self.task_events.notify_waiters();
        Ok(())
    }

    /// Resolve once the task is Completed or Failed.
    pub async fn wait_for_task(&self, id: &TaskId) -> TeamResult<Task> {
        loop {
            let mut notified = std::pin::pin!(self.task_events.notified());
            notified.as_mut().enable();
            {
                let graph = self.graph();
                let task = graph.get(id).ok_or(TeamError::TaskNotFound(*id))?;
                if task.status.is_terminal() {
                    return Ok(task.clone());
                }
            }
            notified.await;
        }
    }

    /// Run the team on `task` and return its answer.
    ///
    /// `coordinator` names the member that plans or leads; an unknown or
    /// missing name falls back to the first member. Agent failures are part
    /// of the answer, so the only error is cancellation through
    /// [`shutdown`](Self::shutdown).
    pub async fn run(&self, task: &str, coordinator: Option<&str>) -> TeamResult<String> {
        self.run_with_cancel(task, coordinator, &CancellationToken::new())
            .await
    }

    /// [`run`](Self::run), also stopped by `cancel`.
    pub async fn run_with_cancel(
        &self,
        task: &str,
        coordinator: Option<&str>,
        cancel: &CancellationToken,
    ) -> TeamResult<String> {
        let roster = self.roster().clone();
        let Some(lead) = pick_coordinator(&roster, coordinator) else {
            warn!(team = %self.name, "Run requested on an empty team");
            return Ok(EMPTY_TEAM_MESSAGE.to_string());
        };
        if let Some(requested) = coordinator
            && requested != lead.name()
        {
            warn!(team = %self.name, requested = %requested, using = %lead.name(), "Unknown coordinator");
        }

        let run_token = self.shutdown.child_token();
        let ctx = StrategyContext {
            team: self.name.clone(),
            roster,
            performance: Arc::clone(&self.performance),
            cancel: run_token.clone(),
            max_parallel: self.config.max_parallel_tasks,
        };

        info!(
            team = %self.name,
            mode = %self.config.collaboration_mode,
            coordinator = %lead.name(),
            "Running team"
        );
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TeamError::Cancelled),
            result = strategy::execute(self.config.collaboration_mode, &ctx, task, &lead) => result,
        };
        run_token.cancel();

        if let Err(err) = &outcome {
            warn!(team = %self.name, error_code = err.error_code(), "Team run stopped");
        }
        outcome
    }

    /// Start a run in the background and return the id of the task that
    /// tracks it.
    ///
    /// The task is created with priority [`ASYNC_TASK_PRIORITY`] and moves
    /// to InProgress straight away. When the run finishes the task becomes
    /// Completed and `callback` receives the result, or it becomes Failed
    /// with the error text. Must be called from within a Tokio runtime.
    pub fn run_async(
        self: &Arc<Self>,
        task: impl Into<String>,
        coordinator: Option<&str>,
        callback: Option<CompletionCallback>,
    ) -> TeamResult<TaskId> {
        if !self.config.enable_async_execution {
            return Err(TeamError::AsyncDisabled(self.name.clone()));
        }

        let task = task.into();
        let mut request = NewTask::new(task.clone()).priority(ASYNC_TASK_PRIORITY);
        if let Some(name) = coordinator {
            request = request.assigned_to(name);
        }
        let id = {
            let mut graph = self.graph();
            let id = graph.create(request);
            graph.mark_started(&id)?;
            id
        };
        info!(team = %self.name, task_id = %id, "Running team in the background");

        let team = Arc::clone(self);
        let coordinator = coordinator.map(str::to_string);
        tokio::spawn(async move {
            let run = {
                let team = Arc::clone(&team);
                tokio::spawn(async move { team.run(&task, coordinator.as_deref()).await })
            };
            let outcome = match run.await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(err)) => Err(err.to_string()),
                Err(join_err) => Err(format!("Team run aborted: {join_err}")),
            };
            team.finish_background_run(id, outcome, callback);
        });

        Ok(id)
    }

    fn finish_background_run(
        &self,
        id: TaskId,
        outcome: Result<String, String>,
        callback: Option<CompletionCallback>,
    ) {
        let recorded = {
            let mut graph = self.graph();
            match &outcome {
                Ok(result) => graph.mark_completed(&id, result.clone()).map(|_| ()),
                Err(message) => graph.mark_failed(&id, message.clone()),
            }
        };

        match (recorded, outcome) {
            (Err(err), _) => {
                warn!(team = %self.name, task_id = %id, error = %err, "Background result discarded");
            }
            (Ok(()), Ok(result)) => {
                info!(team = %self.name, task_id = %id, "Background run completed");
                if let Some(callback) = callback {
                    callback(result);
                }
            }
            (Ok(()), Err(message)) => {
                error!(team = %self.name, task_id = %id, error = %message, "Background run failed");
            }
        }
        self.task_events.notify_waiters();
    }

    /// Per-agent statistics, empty when tracking is disabled.
    pub fn performance_metrics(&self) -> BTreeMap<String, PerformanceRecord> {
        self.performance.snapshot()
    }

    pub fn agent_performance(&self, name: &str) -> Option<PerformanceRecord> {
        self.performance.get(name)
    }

    /// Cancel every in-flight run and refuse new ones.
    pub fn shutdown(&self) {
        info!(team = %self.name, "Shutting down team");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn roster(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn Coworker>>> {
        self.roster.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn roster_mut(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn Coworker>>> {
        self.roster.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn graph(&self) -> MutexGuard<'_, TaskGraph> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Team")
            .field("name", &self.name)
            .field("mode", &self.config.collaboration_mode)
            .field("agents", &self.agent_names())
            .field("tasks", &self.graph().len())
            .finish()
    }
}

fn pick_coordinator(
    roster: &[Arc<dyn Coworker>],
    requested: Option<&str>,
) -> Option<Arc<dyn Coworker>> {
    requested
        .and_then(|name| roster.iter().find(|a| a.name() == name))
        .or_else(|| roster.first())
        .cloned()
}
