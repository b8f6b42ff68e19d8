use covey_core::{ArgSpec, ArgType, ArgsSchema, Tool, ToolArgs, ToolError};
use serde_json::Value;

type ToolFn = dyn Fn(&ToolArgs) -> Result<Value, ToolError> + Send + Sync;

/// A tool backed by a closure.
///
/// The closure receives arguments that have already passed schema
/// validation.
pub struct FunctionTool {
    name: String,
    description: String,
    schema: ArgsSchema,
    function: Box<ToolFn>,
}

impl FunctionTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, function: F) -> Self
    where
        F: Fn(&ToolArgs) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: ArgsSchema::new(),
            function: Box::new(function),
        }
    }

    /// Declare an argument.
    pub fn with_arg(
        mut self,
        name: impl Into<String>,
        kind: ArgType,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        let spec = ArgSpec {
            kind,
            required,
            description: Some(description.into()),
        };
        self.schema.insert(name, spec);
        self
    }

    /// Replace the whole schema.
    pub fn with_schema(mut self, schema: ArgsSchema) -> Self {
        self.schema = schema;
        self
    }
}

impl Tool for FunctionTool {
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
        (self.function)(args)
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
