//! # Mock Tools for Testing
//!
//! Tools with predictable responses that record every call they receive.

use covey_core::{ArgSpec, ArgType, ArgsSchema, Tool, ToolArgs, ToolError};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

/// A tool that returns a fixed result and records its arguments.
///
/// Calls are only recorded when they pass schema validation, since
/// validation happens before the body runs.
#[derive(Debug, Clone)]
pub struct MockTool {
    name: String,
    description: String,
    schema: ArgsSchema,
    response: Result<Value, ToolError>,
    echo_arg: Option<String>,
    history: Arc<Mutex<Vec<ToolArgs>>>,
}

impl MockTool {
    /// Create a mock tool that returns `"Mock response for: <name>"`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            response: Ok(Value::String(format!("Mock response for: {name}"))),
            description: format!("Mock tool {name}"),
            name,
            schema: ArgsSchema::new(),
            echo_arg: None,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A tool that returns the value of argument `arg` unchanged.
    pub fn echo(name: impl Into<String>, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        let mut tool = Self::new(name);
        tool.schema.insert(arg.clone(), ArgSpec::required(ArgType::String));
        tool.echo_arg = Some(arg);
        tool
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, spec: ArgSpec) -> Self {
        self.schema.insert(name, spec);
        self
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Ok(response);
        self.echo_arg = None;
        self
    }

    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.response = Err(ToolError::failed(message));
        self.echo_arg = None;
        self
    }

    pub fn call_count(&self) -> usize {
        self.history().len()
    }

    /// Arguments of every executed call, oldest first.
    pub fn call_history(&self) -> Vec<ToolArgs> {
        self.history().clone()
    }

    pub fn reset(&self) {
        self.history().clear();
    }

    fn history(&self) -> std::sync::MutexGuard<'_, Vec<ToolArgs>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn args_schema(&self) -> &ArgsSchema {
        &self.schema
    }

    fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        self.history().push(args.clone());
        match &self.echo_arg {
            Some(arg) => Ok(args.get(arg).cloned().unwrap_or(Value::Null)),
            None => self.response.clone(),
        }
    }
}
