//! # Covey Tools
//!
//! Tool registry and a small library of standard tools.
//!
//! - [`ToolRegistry`] keeps tools in insertion order and resolves names
//!   case-insensitively, which is how agents look tools up.
//! - [`FunctionTool`] wraps a closure together with its argument schema.
//! - [`standard`] holds ready-made tools: an arithmetic calculator and text
//!   utilities.
//!
//! # Example
//!
//! ```rust
//! use covey_core::{ArgType, Tool, ToolArgs};
//! use covey_tools::{FunctionTool, ToolRegistry};
//! use serde_json::{Value, json};
//!
//! let echo = FunctionTool::new("echo", "Echo the input back", |args: &ToolArgs| {
//!     Ok(args.get("text").cloned().unwrap_or(Value::Null))
//! })
//! .with_arg("text", ArgType::String, true, "Text to echo");
//!
//! let mut registry = ToolRegistry::new();
//! registry.add(echo);
//!
//! let tool = registry.find("ECHO").unwrap();
//! let mut args = ToolArgs::new();
//! args.insert("text".into(), json!("hi"));
//! assert_eq!(tool.invoke(&args).unwrap(), json!("hi"));
//! ```

pub mod function;
pub mod registry;
pub mod standard;

pub use function::FunctionTool;
pub use registry::ToolRegistry;
pub use standard::{CalculatorTool, TextAnalyzeTool, TextTransformTool, standard_tools};

// Re-export the capability types tool authors need
pub use covey_core::{ArgSpec, ArgType, ArgsSchema, Tool, ToolArgs, ToolError};
