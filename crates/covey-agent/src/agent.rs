//! The bounded reasoning loop.

use covey_core::{GenerationOptions, Memory, Model, Tool, ToolArgs, render_tool_output};
use covey_memory::RollingMemory;
use covey_tools::ToolRegistry;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::conversation::Conversation;
use crate::error::{AgentError, AgentResult};
use crate::parser::ModelReply;

/// Returned when the iteration budget runs out without a final answer.
pub const ITERATION_LIMIT_MESSAGE: &str =
    "I apologize, but I was unable to complete the task within the allowed number of iterations.";

/// Corrective instruction appended after a reply with no usable marker.
pub const FORMAT_REMINDER: &str =
    "Please use the specified format for tool usage or provide a final answer.";

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

const DEFAULT_DESCRIPTION: &str = "A general-purpose AI assistant.";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    FinalAnswer,
    IterationLimit,
}

/// One tool invocation made during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    /// Name as written by the model.
    pub name: String,
    pub args: ToolArgs,
    /// What was fed back to the model.
    pub feedback: String,
    /// `false` when the tool was unknown or failed.
    pub succeeded: bool,
}

/// Trace of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRun {
    pub answer: String,
    pub outcome: RunOutcome,
    pub iterations: usize,
    pub model_calls: usize,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// An LLM-driven worker that answers one task at a time.
///
/// Each run alternates between asking the model what to do and executing the
/// tool it picks, until the model gives a final answer or the iteration
/// budget runs out.
pub struct Agent {
    name: String,
    description: String,
    system_prompt: Option<String>,
    model: Arc<dyn Model>,
    tools: RwLock<ToolRegistry>,
    memory: Arc<dyn Memory>,
    max_iterations: usize,
    options: GenerationOptions,
}

impl Agent {
    pub fn builder(name: impl Into<String>, model: Arc<dyn Model>) -> AgentBuilder {
        AgentBuilder::new(name, model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn generation_options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn model(&self) -> &Arc<dyn Model> {
        &self.model
    }

    /// The system prompt for the next run.
    ///
    /// Without a custom prompt this introduces the agent, lists its current
    /// tools and explains the reply format.
    pub fn system_prompt(&self) -> String {
        match &self.system_prompt {
            Some(prompt) => prompt.clone(),
            None => self.default_system_prompt(),
        }
    }

    fn default_system_prompt(&self) -> String {
        let tools = self.tools().describe();
        format!(
            "You are {name}, {description}\n\n{tools}\n\n\
             To use a tool, use the following format:\n\
             Action: tool_name\n\
             Action Input: {{\n    \"arg1\": \"value1\",\n    \"arg2\": \"value2\"\n}}\n\n\
             When you have a final answer, use the following format:\n\
             Final Answer: your final answer here\n\n\
             Begin!\n",
            name = self.name,
            description = self.description,
        )
    }

    /// Add a tool, replacing one with the same name (ignoring case).
    pub fn add_tool(&self, tool: Arc<dyn Tool>) {
        self.tools_mut().add_shared(tool);
    }

    /// Remove a tool by name (ignoring case).
    pub fn remove_tool(&self, name: &str) -> bool {
        self.tools_mut().remove(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools().names()
    }

    pub fn find_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools().find(name)
    }

    pub fn memory(&self) -> &Arc<dyn Memory> {
        &self.memory
    }

    /// Current memory context, unranked.
    pub fn memory_context(&self) -> String {
        self.memory.context(None)
    }

    pub fn add_to_memory(&self, content: &str) {
        self.memory.add(content, None);
    }

    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    /// Run `task` to completion.
    pub async fn run(&self, task: &str) -> AgentResult<String> {
        self.run_with_cancel(task, &CancellationToken::new()).await
    }

    /// Run `task`, aborting if `cancel` fires.
    ///
    /// Cancellation is observed before every model call, while waiting on the
    /// model, and before every tool invocation.
    pub async fn run_with_cancel(
        &self,
        task: &str,
        cancel: &CancellationToken,
    ) -> AgentResult<String> {
        self.run_traced(task, cancel).await.map(|run| run.answer)
    }

    /// Run `task` and return a trace of what happened.
    pub async fn run_traced(
        &self,
        task: &str,
        cancel: &CancellationToken,
    ) -> AgentResult<AgentRun> {
        info!(agent = %self.name, task = %task, "Running agent");

        let mut conversation = Conversation::new();
        conversation.system(self.system_prompt());
        let context = self.memory.context(None);
        if !context.is_empty() {
            conversation.system(format!("Context from memory:\n\n{context}"));
        }
        conversation.user(task);

        let mut tool_calls = Vec::new();
        let mut model_calls = 0;

        for iteration in 0..self.max_iterations {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            let response = self.think(&conversation, cancel).await?;
            model_calls += 1;

            match ModelReply::parse(&response) {
                ModelReply::ToolCall { name, args } => {
                    debug!(agent = %self.name, iteration, tool = %name, "Model requested tool");
                    conversation.assistant(response);

                    let record = match self.find_tool(&name) {
                        Some(tool) => {
                            if cancel.is_cancelled() {
                                return Err(AgentError::Cancelled);
                            }
                            match tool.invoke(&args) {
                                Ok(value) => ToolCallRecord {
                                    feedback: format!("Tool result: {}", render_tool_output(&value)),
                                    succeeded: true,
                                    name,
                                    args,
                                },
                                Err(err) => {
                                    debug!(agent = %self.name, tool = %name, error = %err, "Tool failed");
                                    ToolCallRecord {
                                        feedback: format!("Error: {err}"),
                                        succeeded: false,
                                        name,
                                        args,
                                    }
                                }
                            }
                        }
                        None => {
                            warn!(agent = %self.name, tool = %name, "Model requested unknown tool");
                            ToolCallRecord {
                                feedback: format!(
                                    "Error: Tool '{name}' not found. Available tools: {}",
                                    self.tool_names().join(", ")
                                ),
                                succeeded: false,
                                name,
                                args,
                            }
                        }
                    };

                    conversation.system(record.feedback.clone());
                    tool_calls.push(record);
                }
                ModelReply::FinalAnswer(answer) => {
                    self.memory
                        .add(&format!("Task: {task}\nAnswer: {answer}"), None);
                    info!(agent = %self.name, iterations = iteration + 1, "Agent finished");
                    return Ok(AgentRun {
                        answer,
                        outcome: RunOutcome::FinalAnswer,
                        iterations: iteration + 1,
                        model_calls,
                        tool_calls,
                    });
                }
                ModelReply::Unparsed => {
                    debug!(agent = %self.name, iteration, "Reply had no usable marker");
                    conversation.assistant(response);
                    conversation.system(FORMAT_REMINDER);
                }
            }
        }

        warn!(
            agent = %self.name,
            max_iterations = self.max_iterations,
            "Iteration limit reached without a final answer"
        );
        Ok(AgentRun {
            answer: ITERATION_LIMIT_MESSAGE.to_string(),
            outcome: RunOutcome::IterationLimit,
            iterations: self.max_iterations,
            model_calls,
            tool_calls,
        })
    }

    /// Render the conversation and ask the model for the next step.
    pub async fn think(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> AgentResult<String> {
        let prompt = conversation.render_prompt();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            result = self.model.generate(&prompt, &self.options) => Ok(result?),
        }
    }

    fn tools(&self) -> std::sync::RwLockReadGuard<'_, ToolRegistry> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn tools_mut(&self) -> std::sync::RwLockWriteGuard<'_, ToolRegistry> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("tools", &self.tool_names())
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    name: String,
    model: Arc<dyn Model>,
    description: String,
    system_prompt: Option<String>,
    tools: ToolRegistry,
    memory: Option<Arc<dyn Memory>>,
    max_iterations: usize,
    options: GenerationOptions,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>, model: Arc<dyn Model>) -> Self {
        Self {
            name: name.into(),
            model,
            description: DEFAULT_DESCRIPTION.to_string(),
            system_prompt: None,
            tools: ToolRegistry::new(),
            memory: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            options: GenerationOptions::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Use a fixed system prompt instead of the generated one.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.add(tool);
        self
    }

    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.add_shared(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Share a memory provider. Agents get a private [`RollingMemory`]
    /// otherwise.
    pub fn memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn generation_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            name: self.name,
            description: self.description,
            system_prompt: self.system_prompt,
            model: self.model,
            tools: RwLock::new(self.tools),
            memory: self
                .memory
                .unwrap_or_else(|| Arc::new(RollingMemory::default())),
            max_iterations: self.max_iterations,
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use covey_core::{ArgType, ModelError, ToolError};
    use covey_tools::FunctionTool;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records prompts.
    struct Replay {
        responses: Mutex<VecDeque<Result<String, ModelError>>>,
        fallback: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Replay {
        fn new<I: IntoIterator<Item = &'static str>>(responses: I, fallback: &str) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
                fallback: fallback.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: ModelError) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(VecDeque::from([Err(err)])),
                fallback: String::new(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Model for Replay {
        fn name(&self) -> &str {
            "replay"
        }

        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    fn echo_tool(name: &str) -> FunctionTool {
        FunctionTool::new(name, "Echo the expression", |args: &ToolArgs| {
            Ok(args.get("expression").cloned().unwrap_or(Value::Null))
        })
        .with_arg("expression", ArgType::String, true, "Expression")
    }

    #[tokio::test]
    async fn test_final_answer_on_first_call() {
        let model = Replay::new(["Final Answer:  X  "], "");
        let agent = Agent::builder("solo", model.clone()).build();

        let run = agent.run_traced("task", &CancellationToken::new()).await.unwrap();
        assert_eq!(run.answer, "X");
        assert_eq!(run.outcome, RunOutcome::FinalAnswer);
        assert_eq!(run.model_calls, 1);
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let model = Replay::new(
            [
                "Action: calc\nAction Input: {\"expression\":\"2+2\"}\n",
                "Final Answer: 4",
            ],
            "",
        );
        let agent = Agent::builder("math", model.clone())
            .tool(echo_tool("calc"))
            .build();

        let run = agent.run_traced("add", &CancellationToken::new()).await.unwrap();
        assert_eq!(run.answer, "4");
        assert_eq!(run.model_calls, 2);
        assert_eq!(run.tool_calls.len(), 1);
        assert_eq!(Value::Object(run.tool_calls[0].args.clone()), json!({"expression": "2+2"}));
        assert!(run.tool_calls[0].succeeded);

        let second = &model.prompts()[1];
        assert!(second.contains("System: Tool result: 2+2\n\n"));
        assert!(second.ends_with("Assistant: "));
    }

    #[tokio::test]
    async fn test_unknown_tool_lists_available_tools() {
        let model = Replay::new(["Action: nope\nAction Input: {}", "Final Answer: ok"], "");
        let agent = Agent::builder("a", model.clone())
            .tool(echo_tool("calc"))
            .tool(echo_tool("other"))
            .build();

        assert_eq!(agent.run("t").await.unwrap(), "ok");
        assert!(model.prompts()[1]
            .contains("System: Error: Tool 'nope' not found. Available tools: calc, other"));
    }

    #[tokio::test]
    async fn test_argument_errors_are_fed_back() {
        let model = Replay::new(["Action: CALC\nAction Input: {}", "Final Answer: gave up"], "");
        let agent = Agent::builder("a", model.clone())
            .tool(echo_tool("calc"))
            .build();

        let run = agent.run_traced("t", &CancellationToken::new()).await.unwrap();
        assert_eq!(run.answer, "gave up");
        assert!(!run.tool_calls[0].succeeded);
        assert!(model.prompts()[1]
            .contains("System: Error: Missing required argument: expression"));
    }

    #[tokio::test]
    async fn test_tool_execution_errors_are_fed_back() {
        let model = Replay::new(["Action: boom\nAction Input: {}", "Final Answer: done"], "");
        let agent = Agent::builder("a", model.clone())
            .tool(FunctionTool::new("boom", "fails", |_: &ToolArgs| {
                Err(ToolError::failed("exploded"))
            }))
            .build();

        assert_eq!(agent.run("t").await.unwrap(), "done");
        assert!(model.prompts()[1].contains("System: Error: exploded\n\n"));
    }

    #[tokio::test]
    async fn test_iteration_limit_returns_fallback() {
        let model = Replay::new([], "still thinking");
        let agent = Agent::builder("a", model.clone()).max_iterations(3).build();

        let run = agent.run_traced("t", &CancellationToken::new()).await.unwrap();
        assert_eq!(run.answer, ITERATION_LIMIT_MESSAGE);
        assert_eq!(run.outcome, RunOutcome::IterationLimit);
        assert_eq!(model.prompts().len(), 3);
        assert!(model.prompts()[2].contains(FORMAT_REMINDER));
    }

    #[tokio::test]
    async fn test_final_answer_is_remembered() {
        let model = Replay::new(["Final Answer: Paris", "Final Answer: again"], "");
        let agent = Agent::builder("a", model.clone()).build();

        agent.run("Capital of France?").await.unwrap();
        assert!(agent
            .memory_context()
            .contains("Task: Capital of France?\nAnswer: Paris"));

        agent.run("Repeat").await.unwrap();
        assert!(model.prompts()[1].contains("System: Context from memory:\n\n["));
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let model = Replay::failing(ModelError::Generation("overloaded".into()));
        let agent = Agent::builder("a", model).build();
        let err = agent.run("t").await.unwrap_err();
        assert_eq!(err, AgentError::Model(ModelError::Generation("overloaded".into())));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let model = Replay::new(["Final Answer: never"], "");
        let agent = Agent::builder("a", model.clone()).build();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(
            agent.run_with_cancel("t", &cancel).await,
            Err(AgentError::Cancelled)
        );
        assert!(model.prompts().is_empty());
    }

    #[test]
    fn test_default_system_prompt() {
        let model = Replay::new([], "");
        let agent = Agent::builder("Ada", model)
            .description("a careful analyst.")
            .tool(echo_tool("calc"))
            .build();

        let prompt = agent.system_prompt();
        assert!(prompt.starts_with("You are Ada, a careful analyst.\n\n"));
        assert!(prompt.contains("- calc: Echo the expression\n"));
        assert!(prompt.contains("Action: tool_name\nAction Input: {\n"));
        assert!(prompt.contains("Final Answer: your final answer here"));
        assert!(prompt.ends_with("Begin!\n"));
    }

    #[test]
    fn test_tool_management() {
        let agent = Agent::builder("a", Replay::new([], ""))
            .system_prompt("custom")
            .build();
        agent.add_tool(Arc::new(echo_tool("calc")));
        agent.add_tool(Arc::new(echo_tool("Search")));
        assert_eq!(agent.tool_names(), vec!["calc", "Search"]);

        assert!(agent.remove_tool("SEARCH"));
        assert!(!agent.remove_tool("search"));
        assert_eq!(agent.tool_names(), vec!["calc"]);
        assert_eq!(agent.system_prompt(), "custom");
    }
}
