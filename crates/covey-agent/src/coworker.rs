use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::agent::Agent;
use crate::error::AgentResult;

/// Anything a team can hand a task to.
///
/// [`Agent`] is the production implementation; tests substitute scripted
/// coworkers.
#[async_trait]
pub trait Coworker: Send + Sync {
    /// Unique name within a team.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Work on `task` until done or until `cancel` fires.
    async fn run(&self, task: &str, cancel: &CancellationToken) -> AgentResult<String>;
}

#[async_trait]
impl Coworker for Agent {
    fn name(&self) -> &str {
        Agent::name(self)
    }

    fn description(&self) -> &str {
        Agent::description(self)
    }

    async fn run(&self, task: &str, cancel: &CancellationToken) -> AgentResult<String> {
        self.run_with_cancel(task, cancel).await
    }
}
