use covey_agent::Coworker;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{StrategyContext, invoke};
use crate::error::TeamResult;
use crate::plan::Plan;

pub(crate) fn plan_prompt(task: &str, roster: &str) -> String {
    format!(
        r#"Task: {task}

You need to create a hierarchical plan to solve this task.
You will be the coordinator, and you'll delegate subtasks to other agents.

Available agents:
{roster}

Create a hierarchical plan with the following format:
[
    {{
        "subtask": "Description of subtask 1",
        "agent_name": "Name of agent for subtask 1"
    }},
    {{
        "subtask": "Description of subtask 2",
        "agent_name": "Name of agent for subtask 2"
    }},
    ...
]"#
    )
}

pub(crate) fn synthesis_prompt(task: &str, plan: &Plan, results: &[String]) -> String {
    let subtasks: Vec<String> = plan
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step.subtask))
        .collect();
    let results: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("Result {}: {result}", i + 1))
        .collect();
    format!(
        "Task: {task}\n\n\
         You delegated the following subtasks to other agents:\n\n{}\n\n\
         Here are the results from each agent:\n\n{}\n\n\
         Please synthesize these results into a final response that addresses the original task.",
        subtasks.join("\n"),
        results.join("\n"),
    )
}

/// The coordinator delegates plan steps one at a time, then merges the
/// results. It never executes a step itself.
pub(crate) async fn run(
    ctx: &StrategyContext,
    task: &str,
    coordinator: &Arc<dyn Coworker>,
) -> TeamResult<String> {
    info!(team = %ctx.team, coordinator = %coordinator.name(), "Running team in hierarchical mode");

    let prompt = plan_prompt(task, &ctx.roster_listing(Some(coordinator.name())));
    let reply = invoke(ctx, coordinator, &prompt).await?.into_text();
    let plan = match Plan::parse(&reply) {
        Ok(plan) => plan,
        Err(err) => {
            error!(team = %ctx.team, error_code = err.error_code(), "Unusable plan");
            return Ok(format!("Error: {err}"));
        }
    };
    debug!(team = %ctx.team, steps = plan.len(), "Plan accepted");

    let mut results = Vec::with_capacity(plan.len());
    for (idx, step) in plan.steps().iter().enumerate() {
        let result = if step.agent_name == coordinator.name() {
            warn!(team = %ctx.team, step = idx, "Plan delegates a step to the coordinator");
            format!(
                "Error: Agent {} is the coordinator and cannot take a delegated subtask",
                step.agent_name
            )
        } else if let Some(agent) = ctx.member(&step.agent_name) {
            invoke(ctx, &agent, &step.subtask).await?.into_text()
        } else {
            warn!(team = %ctx.team, step = idx, agent = %step.agent_name, "Plan names an unknown agent");
            format!("Error: Agent {} not found", step.agent_name)
        };
        results.push(result);
    }

    let prompt = synthesis_prompt(task, &plan, &results);
    Ok(invoke(ctx, coordinator, &prompt).await?.into_text())
}
