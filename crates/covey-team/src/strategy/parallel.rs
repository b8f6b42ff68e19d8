use covey_agent::Coworker;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

use super::{Contribution, StrategyContext, invoke};
use crate::error::{TeamError, TeamResult};
use crate::plan::{Plan, PlanStep};

pub(crate) fn plan_prompt(task: &str, roster: &str) -> String {
    format!(
        r#"Task: {task}

You need to create a plan to solve this task by breaking it down into subtasks.
Each subtask will be assigned to a different agent.

Available agents:
{roster}

Create a plan with the following format:
[
    {{
        "subtask": "Description of subtask 1",
        "agent_name": "Name of agent for subtask 1",
        "depends_on": []
    }},
    {{
        "subtask": "Description of subtask 2",
        "agent_name": "Name of agent for subtask 2",
        "depends_on": [0]
    }},
    ...
]

The "depends_on" field should contain the indices of the subtasks that this subtask depends on.
If a subtask doesn't depend on any other subtasks, use an empty list."#
    )
}

pub(crate) fn step_prompt(task: &str, step: &PlanStep, results: &[Option<String>]) -> String {
    let dependencies: String = step
        .depends_on
        .iter()
        .filter_map(|&dep| {
            results[dep]
                .as_ref()
                .map(|r| format!("Result from step {dep}: {r}\n\n"))
        })
        .collect();
    format!(
        "Task: {task}\n\nYour specific subtask: {}\n\n{dependencies}\n\nPlease complete your subtask.",
        step.subtask
    )
}

pub(crate) fn render_results(plan: &Plan, results: &[String]) -> String {
    let mut rendered = String::from("Task Execution Results:\n\n");
    for (idx, (step, result)) in plan.steps().iter().zip(results).enumerate() {
        rendered.push_str(&format!(
            "Step {idx} ({} - {}):\n{result}\n\n",
            step.agent_name, step.subtask
        ));
    }
    rendered
}

/// The coordinator plans; each step runs as soon as every step it depends
/// on has a result, with at most `max_parallel` steps in flight.
pub(crate) async fn run(
    ctx: &StrategyContext,
    task: &str,
    coordinator: &Arc<dyn Coworker>,
) -> TeamResult<String> {
    info!(team = %ctx.team, coordinator = %coordinator.name(), "Running team in parallel mode");

    let prompt = plan_prompt(task, &ctx.roster_listing(None));
    let reply = invoke(ctx, coordinator, &prompt).await?.into_text();
    let plan = match Plan::parse(&reply) {
        Ok(plan) => plan,
        Err(err) => {
            error!(team = %ctx.team, error_code = err.error_code(), "Unusable plan");
            return Ok(format!("Error: {err}"));
        }
    };
    debug!(team = %ctx.team, steps = plan.len(), "Plan accepted");

    let results = execute_plan(ctx, task, &plan).await?;
    Ok(render_results(&plan, &results))
}

struct Scheduler<'a> {
    ctx: &'a StrategyContext,
    task: &'a str,
    plan: &'a Plan,
    results: Vec<Option<String>>,
    launched: Vec<bool>,
    limit: Arc<Semaphore>,
    workers: JoinSet<(usize, TeamResult<String>)>,
    owners: HashMap<Id, usize>,
}

impl Scheduler<'_> {
    /// Launch every step whose dependencies all have results.
    ///
    /// Steps naming an unknown agent get their error result immediately,
    /// which can unblock other steps, so this repeats until nothing changes.
    fn launch_eligible(&mut self) {
        let plan = self.plan;
        loop {
            let mut resolved_inline = false;
            for (idx, step) in plan.steps().iter().enumerate() {
                if self.launched[idx] || !step.depends_on.iter().all(|&d| self.results[d].is_some())
                {
                    continue;
                }
                self.launched[idx] = true;

                let Some(agent) = self.ctx.member(&step.agent_name) else {
                    warn!(team = %self.ctx.team, step = idx, agent = %step.agent_name, "Plan names an unknown agent");
                    self.results[idx] = Some(format!("Error: Agent {} not found", step.agent_name));
                    resolved_inline = true;
                    continue;
                };

                let prompt = step_prompt(self.task, step, &self.results);
                let ctx = self.ctx.clone();
                let limit = Arc::clone(&self.limit);
                debug!(team = %ctx.team, step = idx, agent = %step.agent_name, "Step eligible");
                let handle = self.workers.spawn(async move {
                    let Ok(_permit) = limit.acquire_owned().await else {
                        return (idx, Err(TeamError::Cancelled));
                    };
                    let outcome = invoke(&ctx, &agent, &prompt)
                        .await
                        .map(Contribution::into_text);
                    (idx, outcome)
                });
                self.owners.insert(handle.id(), idx);
            }
            if !resolved_inline {
                return;
            }
        }
    }
}

async fn execute_plan(ctx: &StrategyContext, task: &str, plan: &Plan) -> TeamResult<Vec<String>> {
    let mut scheduler = Scheduler {
        ctx,
        task,
        plan,
        results: vec![None; plan.len()],
        launched: vec![false; plan.len()],
        limit: Arc::new(Semaphore::new(ctx.max_parallel.max(1))),
        workers: JoinSet::new(),
        owners: HashMap::new(),
    };

    scheduler.launch_eligible();
    while let Some(joined) = scheduler.workers.join_next_with_id().await {
        match joined {
            Ok((_, (idx, Ok(output)))) => scheduler.results[idx] = Some(output),
            Ok((_, (_, Err(err)))) => {
                scheduler.workers.abort_all();
                return Err(err);
            }
            Err(join_err) => match scheduler.owners.get(&join_err.id()) {
                Some(&idx) => {
                    error!(team = %ctx.team, step = idx, error = %join_err, "Step worker died");
                    scheduler.results[idx] = Some(format!("Error: {join_err}"));
                }
                None => {
                    error!(team = %ctx.team, task_id = %join_err.id(), error = %join_err, "Unowned step worker died");
                }
            },
        }
        scheduler.launch_eligible();
    }

    Ok(settle(&ctx.team, scheduler.results, &scheduler.launched))
}

/// Fill in steps that never produced a result.
fn settle(team: &str, results: Vec<Option<String>>, launched: &[bool]) -> Vec<String> {
    results
        .into_iter()
        .zip(launched)
        .enumerate()
        .map(|(idx, (result, &was_launched))| match result {
            Some(result) => result,
            None if was_launched => {
                warn!(team = %team, step = idx, "Step worker stopped without a result");
                "Error: Step worker stopped before reporting a result".to_string()
            }
            None => {
                warn!(team = %team, step = idx, "Step never became eligible");
                "Error: Step was never run because its dependencies form a cycle".to_string()
            }
        })
        .collect()
}
