//! # Text Processing Tools
//!
//! Tools for simple text analysis and transformation.

use covey_core::{ArgSpec, ArgType, ArgsSchema, Tool, ToolArgs, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn text_arg(args: &ToolArgs) -> Result<&str, ToolError> {
    args.get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::failed("text must be a string"))
}

/// Statistics reported by [`TextAnalyzeTool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: text.lines().count(),
        }
    }
}

/// Counts characters, words and lines.
pub struct TextAnalyzeTool {
    schema: ArgsSchema,
}

impl TextAnalyzeTool {
    pub fn new() -> Self {
        Self {
            schema: ArgsSchema::new().arg(
                "text",
                ArgSpec::required(ArgType::String).describe("Text to analyze"),
            ),
        }
    }
}

impl Default for TextAnalyzeTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for TextAnalyzeTool {
    fn name(&self) -> &str {
        "text_analyze"
    }

    fn description(&self) -> &str {
        "Count the characters, words and lines in a piece of text"
    }

    fn args_schema(&self) -> &ArgsSchema {
        &self.schema
    }

    fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let stats = TextStats::of(text_arg(args)?);
        serde_json::to_value(stats).map_err(|e| ToolError::failed(e.to_string()))
    }
}

/// Supported text transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOperation {
    Uppercase,
    Lowercase,
    Reverse,
}

impl TextOperation {
    pub fn apply(&self, text: &str) -> String {
        match self {
            TextOperation::Uppercase => text.to_uppercase(),
            TextOperation::Lowercase => text.to_lowercase(),
            TextOperation::Reverse => text.chars().rev().collect(),
        }
    }
}

/// Applies a [`TextOperation`].
pub struct TextTransformTool {
    schema: ArgsSchema,
}

impl TextTransformTool {
    pub fn new() -> Self {
        Self {
            schema: ArgsSchema::new()
                .arg(
                    "text",
                    ArgSpec::required(ArgType::String).describe("Text to transform"),
                )
                .arg(
                    "operation",
                    ArgSpec::required(ArgType::String)
                        .describe("One of: uppercase, lowercase, reverse"),
                ),
        }
    }
}

impl Default for TextTransformTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for TextTransformTool {
    fn name(&self) -> &str {
        "text_transform"
    }

    fn description(&self) -> &str {
        "Transform text to upper case, lower case or reverse it"
    }

    fn args_schema(&self) -> &ArgsSchema {
        &self.schema
    }

    fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let text = text_arg(args)?;
        let operation = args.get("operation").cloned().unwrap_or(Value::Null);
        let operation: TextOperation = serde_json::from_value(operation.clone())
            .map_err(|_| ToolError::failed(format!("Unsupported operation: {operation}")))?;
        Ok(Value::String(operation.apply(text)))
    }
}
