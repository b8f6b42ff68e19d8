//! # Calculator Tool
//!
//! Evaluates arithmetic expressions with a small grammar instead of handing
//! text to an interpreter:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | '+' unary | atom
//! atom   := number | '(' expr ')'
//! ```

use covey_core::{ArgSpec, ArgType, ArgsSchema, Tool, ToolArgs, ToolError};
use serde_json::Value;
use thiserror::Error;
use winnow::ascii::{float, multispace0};
use winnow::combinator::{alt, delimited, preceded, repeat};
use winnow::error::{ContextError, ErrMode, ModalResult};
use winnow::prelude::*;
use winnow::token::one_of;

/// Largest integer an f64 represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Invalid expression: {0}")]
    Syntax(String),

    #[error("Expression does not evaluate to a finite number (division by zero?)")]
    NotFinite,
}

impl From<CalcError> for ToolError {
    fn from(err: CalcError) -> Self {
        ToolError::ExecutionFailed(err.to_string())
    }
}

/// Deepest nesting of parentheses and unary signs accepted.
pub const MAX_NESTING: usize = 64;

/// Evaluate an arithmetic expression.
///
/// Expressions nested deeper than [`MAX_NESTING`] are rejected as syntax
/// errors.
pub fn evaluate(text: &str) -> Result<f64, CalcError> {
    let value = delimited(multispace0, |i: &mut &str| expr(i, 0), multispace0)
        .parse(text)
        .map_err(|e| CalcError::Syntax(e.to_string()))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

fn expr(input: &mut &str, depth: usize) -> ModalResult<f64> {
    let init = term(input, depth)?;
    repeat(0.., (operator(['+', '-']), |i: &mut &str| term(i, depth)))
        .fold(
            move || init,
            |acc, (op, rhs): (char, f64)| if op == '+' { acc + rhs } else { acc - rhs },
        )
        .parse_next(input)
}

fn term(input: &mut &str, depth: usize) -> ModalResult<f64> {
    let init = unary(input, depth)?;
    repeat(0.., (operator(['*', '/']), |i: &mut &str| unary(i, depth)))
        .fold(
            move || init,
            |acc, (op, rhs): (char, f64)| if op == '*' { acc * rhs } else { acc / rhs },
        )
        .parse_next(input)
}

fn unary(input: &mut &str, depth: usize) -> ModalResult<f64> {
    if depth > MAX_NESTING {
        return Err(ErrMode::Cut(ContextError::new()));
    }
    alt((
        preceded(('-', multispace0), |i: &mut &str| unary(i, depth + 1)).map(|v: f64| -v),
        preceded(('+', multispace0), |i: &mut &str| unary(i, depth + 1)),
        |i: &mut &str| atom(i, depth),
    ))
    .parse_next(input)
}

fn atom(input: &mut &str, depth: usize) -> ModalResult<f64> {
    alt((
        delimited(
            ('(', multispace0),
            |i: &mut &str| expr(i, depth + 1),
            (multispace0, ')'),
        ),
        number,
    ))
    .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f64> {
    let value: f64 = float.parse_next(input)?;
    Ok(value)
}

fn operator<'i>(ops: [char; 2]) -> impl Parser<&'i str, char, ErrMode<ContextError>> {
    delimited(multispace0, one_of(ops), multispace0)
}

/// Tool exposing [`evaluate`] as `calculate`.
pub struct CalculatorTool {
    schema: ArgsSchema,
}

impl CalculatorTool {
    pub fn new() -> Self {
        Self {
            schema: ArgsSchema::new().arg(
                "expression",
                ArgSpec::required(ArgType::String)
                    .describe("Arithmetic expression using + - * / and parentheses"),
            ),
        }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression"
    }

    fn args_schema(&self) -> &ArgsSchema {
        &self.schema
    }

    fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let expression = args
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::failed("expression must be a string"))?;

        let value = evaluate(expression)?;
        if value.fract() == 0.0 && value.abs() < MAX_EXACT_INT {
            Ok(Value::from(value as i64))
        } else {
            Ok(Value::from(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("2+2", 4.0)]
    #[case(" 2 * (3 + 4) ", 14.0)]
    #[case("10 / 4", 2.5)]
    #[case("-3 + 5", 2.0)]
    #[case("2 - -3", 5.0)]
    #[case("8 - 2 - 1", 5.0)]
    #[case("2 * 3 + 4 * 5", 26.0)]
    #[case("1.5e2 / 3", 50.0)]
    #[case("-(2 + 3) * 2", -10.0)]
    fn test_evaluate(#[case] text: &str, #[case] expected: f64) {
        let value = evaluate(text).unwrap();
        assert!((value - expected).abs() < 1e-9, "{text} = {value}");
    }

    #[rstest]
    #[case("")]
    #[case("2 +")]
    #[case("(1 + 2")]
    #[case("2 ** 3")]
    #[case("__import__('os')")]
    fn test_rejects_malformed_input(#[case] text: &str) {
        assert!(matches!(evaluate(text), Err(CalcError::Syntax(_))));
    }

    #[test]
    fn test_nesting_is_bounded() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(evaluate(&nested(50)), Ok(1.0));
        assert_eq!(evaluate(&format!("{}2", "-".repeat(40))), Ok(2.0));

        assert!(matches!(evaluate(&nested(4000)), Err(CalcError::Syntax(_))));
        assert!(matches!(
            evaluate(&format!("{}1", "-".repeat(50_000))),
            Err(CalcError::Syntax(_))
        ));

        let tool = CalculatorTool::new();
        let mut args = ToolArgs::new();
        args.insert("expression".into(), json!(nested(4000)));
        assert!(matches!(tool.invoke(&args), Err(ToolError::ExecutionFailed(_))));
    }

    #[test]
    fn test_division_by_zero_fails() {
        assert_eq!(evaluate("1 / 0"), Err(CalcError::NotFinite));
        assert_eq!(evaluate("0 / 0"), Err(CalcError::NotFinite));
    }

    #[test]
    fn test_tool_returns_integers_when_exact() {
        let tool = CalculatorTool::new();
        let mut args = ToolArgs::new();
        args.insert("expression".into(), json!("6 * 7"));
        assert_eq!(tool.invoke(&args).unwrap(), json!(42));

        args.insert("expression".into(), json!("1 / 4"));
        assert_eq!(tool.invoke(&args).unwrap(), json!(0.25));
    }

    #[test]
    fn test_tool_errors() {
        let tool = CalculatorTool::new();
        let err = tool.invoke(&ToolArgs::new()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required argument: expression");

        let mut args = ToolArgs::new();
        args.insert("expression".into(), json!("5 / 0"));
        let err = tool.invoke(&args).unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
    }

    proptest! {
        #[test]
        fn prop_addition_matches_native(a in -1000i32..1000, b in -1000i32..1000) {
            let text = format!("{a} + ({b})");
            let value = evaluate(&text).unwrap();
            prop_assert_eq!(value, f64::from(a + b));
        }
    }
}
