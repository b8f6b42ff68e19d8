//! Deterministic parsing of model replies.
//!
//! Replies follow a loose text protocol:
//!
//! ```text
//! Action: tool_name
//! Action Input: {"arg": "value"}
//! ```
//!
//! or
//!
//! ```text
//! Final Answer: the answer
//! ```
//!
//! A tool call takes precedence over a final answer when a reply carries
//! both markers.

use covey_core::ToolArgs;
use serde_json::Value;

const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const FINAL_ANSWER: &str = "Final Answer:";

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Invoke a tool.
    ToolCall { name: String, args: ToolArgs },
    /// Stop and answer.
    FinalAnswer(String),
    /// Neither marker was usable.
    Unparsed,
}

impl ModelReply {
    /// Classify `response`.
    ///
    /// 1. The first line that starts with `Action:` names a tool, provided
    ///    the name is not blank. Arguments are the JSON object spanning from
    ///    the first `{` after the first `Action Input:` marker to the last `}`
    ///    of the response; anything missing or malformed yields no arguments.
    /// 2. Otherwise the trimmed text after the first `Final Answer:`, up to
    ///    any later `Final Answer:`, is the answer.
    /// 3. Otherwise the reply is unparsed.
    pub fn parse(response: &str) -> Self {
        if let Some(name) = tool_name(response) {
            return ModelReply::ToolCall {
                name,
                args: tool_args(response),
            };
        }

        match response.find(FINAL_ANSWER) {
            Some(idx) => {
                let rest = &response[idx + FINAL_ANSWER.len()..];
                let answer = rest.find(FINAL_ANSWER).map_or(rest, |end| &rest[..end]);
                ModelReply::FinalAnswer(answer.trim().to_string())
            }
            None => ModelReply::Unparsed,
        }
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self, ModelReply::ToolCall { .. })
    }
}

fn tool_name(response: &str) -> Option<String> {
    let line = response.lines().find(|line| line.starts_with(ACTION))?;
    let name = line[ACTION.len()..].trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn tool_args(response: &str) -> ToolArgs {
    let Some(marker) = response.find(ACTION_INPUT) else {
        return ToolArgs::new();
    };
    let input = &response[marker + ACTION_INPUT.len()..];

    let (Some(start), Some(end)) = (input.find('{'), input.rfind('}')) else {
        return ToolArgs::new();
    };
    if end < start {
        return ToolArgs::new();
    }

    match serde_json::from_str::<Value>(&input[start..=end]) {
        Ok(Value::Object(map)) => map,
        _ => ToolArgs::new(),
    }
}
