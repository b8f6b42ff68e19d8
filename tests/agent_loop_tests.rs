//! Integration tests for the agent reasoning loop.
//!
//! These drive real agents and the standard tools through scripted models,
//! checking what the model is shown on every turn.

use covey::agent::{
    Agent, AgentError, FORMAT_REMINDER, ITERATION_LIMIT_MESSAGE, RunOutcome,
};
use covey::core::{Model, ModelError};
use covey::memory::{RollingMemory, RollingMemoryConfig};
use covey::tools::{CalculatorTool, TextAnalyzeTool};
use covey_testing::{FailingModel, MockTool, ScriptedModel};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn agent_with(model: &ScriptedModel) -> Agent {
    Agent::builder("analyst", Arc::new(model.clone()) as Arc<dyn Model>)
        .description("Does sums")
        .tool(CalculatorTool::new())
        .tool(TextAnalyzeTool::new())
        .build()
}

#[tokio::test]
async fn test_tool_result_is_fed_back_before_final_answer() {
    let model = ScriptedModel::with_replies(
        "scripted",
        [
            "I should compute this.\nAction: calculate\nAction Input: {\"expression\": \"17 * 23\"}",
            "Final Answer: 17 * 23 = 391",
        ],
    );
    let agent = agent_with(&model);

    let run = agent
        .run_traced("What is 17 * 23?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.answer, "17 * 23 = 391");
    assert_eq!(run.outcome, RunOutcome::FinalAnswer);
    assert_eq!(run.iterations, 2);
    assert_eq!(run.model_calls, 2);
    assert_eq!(run.tool_calls.len(), 1);
    assert!(run.tool_calls[0].succeeded);
    assert_eq!(run.tool_calls[0].feedback, "Tool result: 391");

    let prompts = model.prompts();
    assert!(prompts[0].contains("User: What is 17 * 23?"));
    assert!(prompts[0].ends_with("Assistant: "));
    assert!(prompts[1].contains("System: Tool result: 391"));
}

#[tokio::test]
async fn test_unknown_tool_and_bad_arguments_are_reported_to_the_model() {
    let model = ScriptedModel::with_replies(
        "scripted",
        [
            "Action: teleport\nAction Input: {}",
            "Action: calculate\nAction Input: {\"expression\": 5}",
            "Final Answer: gave up",
        ],
    );
    let agent = agent_with(&model);

    let run = agent
        .run_traced("Go somewhere", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.answer, "gave up");
    assert_eq!(run.tool_calls.len(), 2);
    assert!(run.tool_calls.iter().all(|call| !call.succeeded));
    assert_eq!(
        run.tool_calls[0].feedback,
        "Error: Tool 'teleport' not found. Available tools: calculate, text_analyze"
    );
    assert!(run.tool_calls[1].feedback.starts_with("Error: "));
    assert!(model.prompts()[2].contains(&run.tool_calls[1].feedback));
}

#[tokio::test]
async fn test_unparsed_replies_exhaust_the_budget() {
    let model = ScriptedModel::new("rambling").with_fallback("Let me think about it some more.");
    let agent = Agent::builder("thinker", Arc::new(model.clone()) as Arc<dyn Model>)
        .max_iterations(3)
        .build();

    let run = agent
        .run_traced("Decide", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.answer, ITERATION_LIMIT_MESSAGE);
    assert_eq!(run.outcome, RunOutcome::IterationLimit);
    assert_eq!(model.call_count(), 3);
    let last = model.last_prompt().unwrap();
    assert_eq!(last.matches(FORMAT_REMINDER).count(), 2);
}

#[tokio::test]
async fn test_answers_are_remembered_across_runs() {
    let memory = RollingMemory::new(RollingMemoryConfig::default());
    let model = ScriptedModel::with_replies(
        "scripted",
        ["Final Answer: Paris", "Final Answer: It is still Paris"],
    );
    let agent = Agent::builder("geo", Arc::new(model.clone()) as Arc<dyn Model>)
        .memory(Arc::new(memory.clone()))
        .build();

    agent.run("Capital of France?").await.unwrap();
    assert_eq!(memory.len(), 1);

    agent.run("Are you sure?").await.unwrap();
    let second = model.last_prompt().unwrap();
    assert!(second.contains("Context from memory:"));
    assert!(second.contains("Task: Capital of France?\nAnswer: Paris"));

    agent.clear_memory();
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_tools_can_be_swapped_at_runtime() {
    let model = ScriptedModel::with_replies(
        "scripted",
        [
            "Action: lookup\nAction Input: {\"q\": \"rust\"}",
            "Final Answer: done",
        ],
    );
    let agent = agent_with(&model);
    let lookup = MockTool::new("lookup");
    agent.add_tool(Arc::new(lookup.clone()));
    assert!(agent.remove_tool("text_analyze"));

    let run = agent
        .run_traced("Look it up", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(agent.tool_names(), vec!["calculate", "lookup"]);
    assert_eq!(lookup.call_count(), 1);
    assert_eq!(lookup.call_history()[0]["q"], "rust");
    assert_eq!(run.tool_calls[0].feedback, "Tool result: Mock response for: lookup");
}

#[tokio::test]
async fn test_model_failures_end_the_run() {
    let agent = Agent::builder("broken", Arc::new(FailingModel::unavailable()) as Arc<dyn Model>)
        .build();

    let err = agent.run("Anything").await.unwrap_err();
    assert!(matches!(err, AgentError::Model(ModelError::Unavailable(_))));
    assert!(!err.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_token_stops_before_the_model_is_called() {
    let model = ScriptedModel::new("idle").with_fallback("Final Answer: too late");
    let agent = agent_with(&model);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = agent.run_with_cancel("Anything", &cancel).await.unwrap_err();
    assert_eq!(err, AgentError::Cancelled);
    assert_eq!(model.call_count(), 0);
}
