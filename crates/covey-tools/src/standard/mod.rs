//! Standard tools that ship with Covey.

pub mod calculator;
pub mod text;

pub use calculator::CalculatorTool;
pub use text::{TextAnalyzeTool, TextTransformTool};

use crate::ToolRegistry;

/// A registry holding every standard tool.
pub fn standard_tools() -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(CalculatorTool::new())
        .with_tool(TextAnalyzeTool::new())
        .with_tool(TextTransformTool::new())
}
