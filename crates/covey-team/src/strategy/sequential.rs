use covey_agent::Coworker;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Contribution, StrategyContext, invoke};
use crate::error::TeamResult;

pub(crate) fn continuation_prompt(task: &str, previous: &str) -> String {
    format!("Task: {task}\n\nPrevious work: {previous}\n\nContinue the work.")
}

/// The coordinator answers first; every other member then refines the
/// latest successful answer in roster order.
pub(crate) async fn run(
    ctx: &StrategyContext,
    task: &str,
    coordinator: &Arc<dyn Coworker>,
) -> TeamResult<String> {
    info!(team = %ctx.team, coordinator = %coordinator.name(), "Running team in sequential mode");

    let mut current = invoke(ctx, coordinator, task).await?.into_text();

    for agent in ctx.roster.iter().filter(|a| a.name() != coordinator.name()) {
        let prompt = continuation_prompt(task, &current);
        match invoke(ctx, agent, &prompt).await? {
            Contribution::Output(output) => current = output,
            Contribution::Failed(_) => {
                warn!(team = %ctx.team, agent = %agent.name(), "Keeping previous result");
            }
        }
    }

    Ok(current)
}
