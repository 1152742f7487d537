pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod recalc;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use error::{FormulaError, SyntaxError};
pub use evaluator::Evaluator;
pub use functions::Function;
pub use lexer::{Lexer, Token};
pub use parser::Parser;
pub use recalc::{compute_all, compute_all_at, recalculate, recalculate_at, RecalcSummary};

use sparkcalc_core::{is_formula_text, Grid, Value};

/// Parse formula text into an AST. A leading `=` is optional.
pub fn parse_formula(text: &str) -> Result<Expr, SyntaxError> {
    parser::parse(text.strip_prefix('=').unwrap_or(text))
}

/// Evaluate what the user typed against the current grid, as a formula bar
/// preview.
///
/// Text starting with `=` is parsed and evaluated; anything else goes through
/// literal coercion.
pub fn parse_and_evaluate(text: &str, grid: &Grid) -> Result<Value, FormulaError> {
    if !is_formula_text(text) {
        return Ok(Value::from_literal(text));
    }

    let expr = parse_formula(text)?;
    match Evaluator::new(grid).evaluate(&expr) {
        Value::Error(kind) => Err(FormulaError::Evaluation(kind)),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkcalc_core::ErrorKind;

    #[test]
    fn test_parse_and_evaluate() {
        let mut grid = Grid::default();
        grid.set_a1("A1", "4").unwrap();

        assert_eq!(parse_and_evaluate("=A1 * 2", &grid), Ok(Value::Number(8.0)));
        assert_eq!(parse_and_evaluate("12", &grid), Ok(Value::Number(12.0)));
        assert_eq!(parse_and_evaluate("hi", &grid), Ok(Value::Text("hi".into())));
    }

    #[test]
    fn test_parse_and_evaluate_errors() {
        let grid = Grid::default();

        let err = parse_and_evaluate("=1 +", &grid).unwrap_err();
        assert!(matches!(err, FormulaError::Syntax(_)));
        assert_eq!(err.kind(), ErrorKind::SyntaxError);

        assert_eq!(
            parse_and_evaluate("=1/0", &grid),
            Err(FormulaError::Evaluation(ErrorKind::DivideByZero))
        );
        assert_eq!(
            parse_and_evaluate("=FOO(1)", &grid),
            Err(FormulaError::Evaluation(ErrorKind::UnknownFunction))
        );
    }

    #[test]
    fn test_parse_formula_accepts_optional_prefix() {
        assert_eq!(parse_formula("=1+2"), parse_formula("1+2"));
        assert_eq!(parse_formula("=SUM(A1:A3)").unwrap().to_string(), "SUM(A1:A3)");
    }
}
