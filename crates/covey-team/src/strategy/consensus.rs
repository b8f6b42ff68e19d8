use covey_agent::Coworker;
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

use super::{StrategyContext, invoke};
use crate::error::TeamResult;

pub(crate) fn consensus_prompt(task: &str, answers: &[(String, String)]) -> String {
    let answers: Vec<String> = answers
        .iter()
        .map(|(name, answer)| format!("{name}: {answer}"))
        .collect();
    format!(
        "Task: {task}\n\n\
         The following agents have provided their responses:\n\n{}\n\n\
         Please synthesize these responses into a consensus that represents the best answer to the task.\n\
         Highlight areas of agreement and address any disagreements.",
        answers.join("\n\n")
    )
}

/// Every member, coordinator included, answers the raw task. The
/// coordinator then merges the answers.
pub(crate) async fn run(
    ctx: &StrategyContext,
    task: &str,
    coordinator: &Arc<dyn Coworker>,
) -> TeamResult<String> {
    info!(
        team = %ctx.team,
        coordinator = %coordinator.name(),
        members = ctx.roster.len(),
        "Running team in consensus mode"
    );

    let outcomes = join_all(ctx.roster.iter().map(|agent| invoke(ctx, agent, task))).await;

    let mut answers = Vec::with_capacity(outcomes.len());
    for (agent, outcome) in ctx.roster.iter().zip(outcomes) {
        answers.push((agent.name().to_string(), outcome?.into_text()));
    }

    let prompt = consensus_prompt(task, &answers);
    Ok(invoke(ctx, coordinator, &prompt).await?.into_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::context;
    use covey_testing::MockCoworker;
    use std::time::Duration;

    fn lead() -> MockCoworker {
        MockCoworker::new("lead", |task| {
            Ok(if task.contains("synthesize these responses") {
                "consensus".to_string()
            } else {
                "SENTINEL-LEAD".to_string()
            })
        })
    }

    #[tokio::test]
    async fn test_synthesis_prompt_contains_every_answer() {
        let lead = lead();
        let a = MockCoworker::replying("a", "SENTINEL-A");
        let b = MockCoworker::replying("b", "SENTINEL-B");
        let ctx = context(&[&lead, &a, &b]);
        let coordinator = ctx.member("lead").unwrap();

        let result = run(&ctx, "decide", &coordinator).await.unwrap();
        assert_eq!(result, "consensus");

        assert_eq!(a.tasks(), vec!["decide"]);
        assert_eq!(b.tasks(), vec!["decide"]);

        let synthesis = lead.tasks().pop().unwrap();
        for sentinel in ["lead: SENTINEL-LEAD", "a: SENTINEL-A", "b: SENTINEL-B"] {
            assert!(synthesis.contains(sentinel), "missing {sentinel}");
        }
        assert!(synthesis.ends_with("Highlight areas of agreement and address any disagreements."));
    }

    #[tokio::test]
    async fn test_failed_answers_are_included_as_errors() {
        let lead = lead();
        let broken = MockCoworker::failing("broken", "offline");
        let ctx = context(&[&lead, &broken]);
        let coordinator = ctx.member("lead").unwrap();

        run(&ctx, "decide", &coordinator).await.unwrap();
        let synthesis = lead.tasks().pop().unwrap();
        assert!(synthesis.contains("broken: Error: Generation failed: offline"));
        assert_eq!(ctx.performance.get("broken").unwrap().tasks_failed, 1);
        assert_eq!(ctx.performance.get("lead").unwrap().tasks_completed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_members_answer_concurrently() {
        let lead = lead();
        let a = MockCoworker::replying("a", "x").with_delay(Duration::from_secs(5));
        let b = MockCoworker::replying("b", "y").with_delay(Duration::from_secs(5));
        let ctx = context(&[&lead, &a, &b]);
        let coordinator = ctx.member("lead").unwrap();

        let started = tokio::time::Instant::now();
        run(&ctx, "decide", &coordinator).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
