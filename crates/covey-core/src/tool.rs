//! Tool capability and argument schemas.
//!
//! A tool declares the arguments it accepts as an [`ArgsSchema`]. Callers go
//! through [`Tool::invoke`], which validates the supplied arguments against
//! the schema and only then runs the tool body.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::ToolError;

/// Arguments passed to a tool, keyed by argument name.
pub type ToolArgs = serde_json::Map<String, Value>;

/// Declared type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ArgType {
    /// Whether `value` is an instance of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ArgType::String => value.is_string(),
            ArgType::Number => value.is_number(),
            ArgType::Boolean => value.is_boolean(),
            ArgType::Array => value.is_array(),
            ArgType::Object => value.is_object(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
            ArgType::Array => "array",
            ArgType::Object => "object",
        }
    }

    /// The type name preceded by its indefinite article.
    pub fn with_article(&self) -> &'static str {
        match self {
            ArgType::String => "a string",
            ArgType::Number => "a number",
            ArgType::Boolean => "a boolean",
            ArgType::Array => "an array",
            ArgType::Object => "an object",
        }
    }
}

impl std::fmt::Display for ArgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of a single argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    #[serde(rename = "type")]
    pub kind: ArgType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArgSpec {
    pub fn required(kind: ArgType) -> Self {
        Self {
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(kind: ArgType) -> Self {
        Self {
            kind,
            required: false,
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered set of argument declarations.
///
/// Declaration order is kept so that validation reports the first missing
/// argument deterministically and prompts list arguments as declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgsSchema {
    args: Vec<(String, ArgSpec)>,
}

impl ArgsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an argument declaration.
    pub fn arg(mut self, name: impl Into<String>, spec: ArgSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: ArgSpec) {
        let name = name.into();
        match self.args.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.args.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArgSpec> {
        self.args
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgSpec)> {
        self.args.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Check `args` against the schema.
    ///
    /// All required arguments are checked before any type is inspected, so a
    /// missing argument wins over a mistyped one. Arguments that the schema
    /// does not declare are passed through untouched.
    pub fn validate(&self, args: &ToolArgs) -> Result<(), ToolError> {
        if let Some((name, _)) = self
            .args
            .iter()
            .find(|(name, spec)| spec.required && !args.contains_key(name))
        {
            return Err(ToolError::MissingArgument { name: name.clone() });
        }

        for (name, spec) in &self.args {
            if let Some(value) = args.get(name)
                && !spec.kind.matches(value)
            {
                return Err(ToolError::InvalidArgumentType {
                    name: name.clone(),
                    expected: spec.kind,
                });
            }
        }

        Ok(())
    }
}

impl Serialize for ArgsSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.args.len()))?;
        for (name, spec) in &self.args {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl FromIterator<(String, ArgSpec)> for ArgsSchema {
    fn from_iter<I: IntoIterator<Item = (String, ArgSpec)>>(iter: I) -> Self {
        let mut schema = ArgsSchema::new();
        for (name, spec) in iter {
            schema.insert(name, spec);
        }
        schema
    }
}

/// A named callable available to agents.
///
/// Tools are stateless from the runtime's point of view and are shared by
/// reference between agents.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Declared arguments. Tools without arguments return an empty schema.
    fn args_schema(&self) -> &ArgsSchema;

    /// Run the tool body. Arguments have already been validated.
    fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError>;

    /// Validate `args` and run the tool.
    ///
    /// The body is never called when validation fails.
    fn invoke(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        debug!(tool = %self.name(), args = ?args, "Invoking tool");
        self.args_schema().validate(args)?;
        let result = self.execute(args);
        match &result {
            Ok(value) => debug!(tool = %self.name(), result = %value, "Tool returned"),
            Err(err) => debug!(tool = %self.name(), error = %err, "Tool failed"),
        }
        result
    }
}

/// Render a tool result the way it is shown back to the model.
///
/// Strings are inserted verbatim; every other value is rendered as compact
/// JSON.
pub fn render_tool_output(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => map,
            _ => panic!("test args must be an object"),
        }
    }

    fn search_schema() -> ArgsSchema {
        ArgsSchema::new()
            .arg("query", ArgSpec::required(ArgType::String))
            .arg("limit", ArgSpec::optional(ArgType::Number))
            .arg("exact", ArgSpec::optional(ArgType::Boolean))
            .arg("tags", ArgSpec::optional(ArgType::Array))
            .arg("filters", ArgSpec::optional(ArgType::Object))
    }

    #[rstest]
    #[case(json!({"query": "rust"}))]
    #[case(json!({"query": "rust", "limit": 3}))]
    #[case(json!({"query": "rust", "limit": 2.5, "exact": true}))]
    #[case(json!({"query": "rust", "tags": ["a"], "filters": {"lang": "en"}}))]
    #[case(json!({"query": "rust", "undeclared": null}))]
    fn test_valid_arguments(#[case] input: Value) {
        assert_eq!(search_schema().validate(&args(input)), Ok(()));
    }

    #[rstest]
    #[case(json!({"query": 1}), "Argument query must be a string")]
    #[case(json!({"query": "x", "limit": "3"}), "Argument limit must be a number")]
    #[case(json!({"query": "x", "exact": "yes"}), "Argument exact must be a boolean")]
    #[case(json!({"query": "x", "tags": "a,b"}), "Argument tags must be an array")]
    #[case(json!({"query": "x", "filters": []}), "Argument filters must be an object")]
    #[case(json!({}), "Missing required argument: query")]
    #[case(json!({"limit": "not a number"}), "Missing required argument: query")]
    fn test_invalid_arguments(#[case] input: Value, #[case] message: &str) {
        let err = search_schema().validate(&args(input)).unwrap_err();
        assert!(err.is_argument_error());
        assert_eq!(err.to_string(), message);
    }

    struct Upper {
        schema: ArgsSchema,
    }

    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase text"
        }

        fn args_schema(&self) -> &ArgsSchema {
            &self.schema
        }

        fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
            let text = args
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::failed("text missing"))?;
            Ok(Value::String(text.to_uppercase()))
        }
    }

    #[test]
    fn test_invoke_validates_before_executing() {
        let tool = Upper {
            schema: ArgsSchema::new().arg("text", ArgSpec::required(ArgType::String)),
        };

        assert_eq!(
            tool.invoke(&args(json!({"text": "hi"}))),
            Ok(Value::String("HI".into()))
        );
        assert_eq!(
            tool.invoke(&ToolArgs::new()),
            Err(ToolError::MissingArgument {
                name: "text".into()
            })
        );
    }

    #[test]
    fn test_schema_serializes_in_declaration_order() {
        let schema = ArgsSchema::new()
            .arg("zeta", ArgSpec::required(ArgType::String))
            .arg("alpha", ArgSpec::optional(ArgType::Number).describe("scale"));
        let rendered = serde_json::to_string(&schema).unwrap();
        assert_eq!(
            rendered,
            r#"{"zeta":{"type":"string","required":true},"alpha":{"type":"number","required":false,"description":"scale"}}"#
        );
    }

    #[test]
    fn test_insert_replaces_existing_declaration() {
        let schema = ArgsSchema::new()
            .arg("a", ArgSpec::required(ArgType::String))
            .arg("a", ArgSpec::optional(ArgType::Number));
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("a"), Some(&ArgSpec::optional(ArgType::Number)));
    }

    #[test]
    fn test_render_tool_output() {
        assert_eq!(render_tool_output(&json!("plain")), "plain");
        assert_eq!(render_tool_output(&json!(4.0)), "4.0");
        assert_eq!(render_tool_output(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
