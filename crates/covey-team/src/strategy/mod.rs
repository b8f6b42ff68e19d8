//! Collaboration strategies.
//!
//! Every strategy receives a snapshot of the roster and the chosen
//! coordinator. Agent failures are folded into the data flow as
//! `"Error: <message>"` text and counted by the performance tracker; only
//! cancellation ends a strategy with an error.

mod consensus;
mod hierarchical;
mod parallel;
mod sequential;

use covey_agent::Coworker;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::CollaborationMode;
use crate::error::{TeamError, TeamResult};
use crate::performance::PerformanceTracker;

/// Everything a strategy needs from its team for one run.
#[derive(Clone)]
pub(crate) struct StrategyContext {
    pub team: String,
    pub roster: Vec<Arc<dyn Coworker>>,
    pub performance: Arc<PerformanceTracker>,
    pub cancel: CancellationToken,
    pub max_parallel: usize,
}

impl StrategyContext {
    /// Roster member with exactly this name.
    pub fn member(&self, name: &str) -> Option<Arc<dyn Coworker>> {
        self.roster.iter().find(|a| a.name() == name).cloned()
    }

    /// One `- name: description` line per member, skipping `except`.
    pub fn roster_listing(&self, except: Option<&str>) -> String {
        self.roster
            .iter()
            .filter(|a| Some(a.name()) != except)
            .map(|a| format!("- {}: {}", a.name(), a.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What one agent call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Contribution {
    Output(String),
    Failed(String),
}

impl Contribution {
    /// The output, or the failure rendered as `"Error: <message>"`.
    pub fn into_text(self) -> String {
        match self {
            Contribution::Output(text) => text,
            Contribution::Failed(message) => format!("Error: {message}"),
        }
    }
}

/// Run `agent` on `prompt`, timing the call for the performance tracker.
pub(crate) async fn invoke(
    ctx: &StrategyContext,
    agent: &Arc<dyn Coworker>,
    prompt: &str,
) -> TeamResult<Contribution> {
    let name = agent.name();
    debug!(team = %ctx.team, agent = %name, "Dispatching to agent");

    let started = Instant::now();
    match agent.run(prompt, &ctx.cancel).await {
        Ok(output) => {
            ctx.performance.record_success(name, started.elapsed());
            Ok(Contribution::Output(output))
        }
        Err(_) if ctx.cancel.is_cancelled() => Err(TeamError::Cancelled),
        Err(err) => {
            error!(
                team = %ctx.team,
                agent = %name,
                error_code = err.error_code(),
                error = %err,
                "Agent run failed"
            );
            ctx.performance.record_failure(name);
            Ok(Contribution::Failed(err.to_string()))
        }
    }
}

/// Run `task` under `mode`.
pub(crate) async fn execute(
    mode: CollaborationMode,
    ctx: &StrategyContext,
    task: &str,
    coordinator: &Arc<dyn Coworker>,
) -> TeamResult<String> {
    match mode {
        CollaborationMode::Sequential => sequential::run(ctx, task, coordinator).await,
        CollaborationMode::Parallel => parallel::run(ctx, task, coordinator).await,
        CollaborationMode::Hierarchical => hierarchical::run(ctx, task, coordinator).await,
        CollaborationMode::Consensus => consensus::run(ctx, task, coordinator).await,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::context;
    use super::*;
    use covey_testing::MockCoworker;

    #[tokio::test]
    async fn test_invoke_records_outcomes() {
        let good = MockCoworker::replying("good", "fine");
        let bad = MockCoworker::failing("bad", "boom");
        let ctx = context(&[&good, &bad]);

        let out = invoke(&ctx, &ctx.roster[0], "x").await.unwrap();
        assert_eq!(out, Contribution::Output("fine".into()));

        let out = invoke(&ctx, &ctx.roster[1], "x").await.unwrap();
        assert_eq!(out.into_text(), "Error: Generation failed: boom");

        assert_eq!(ctx.performance.get("good").unwrap().tasks_completed, 1);
        assert_eq!(ctx.performance.get("bad").unwrap().tasks_failed, 1);
    }

    #[tokio::test]
    async fn test_invoke_reports_cancellation() {
        let agent = MockCoworker::replying("a", "never");
        let ctx = context(&[&agent]);
        ctx.cancel.cancel();

        assert_eq!(
            invoke(&ctx, &ctx.roster[0], "x").await,
            Err(TeamError::Cancelled)
        );
        assert_eq!(ctx.performance.get("a").unwrap().tasks_failed, 0);
    }

    #[test]
    fn test_roster_listing_skips_coordinator() {
        let lead = MockCoworker::replying("lead", "").with_description("plans");
        let dev = MockCoworker::replying("dev", "").with_description("builds");
        let ctx = context(&[&lead, &dev]);
        assert_eq!(ctx.roster_listing(None), "- lead: plans\n- dev: builds");
        assert_eq!(ctx.roster_listing(Some("lead")), "- dev: builds");
    }
}
