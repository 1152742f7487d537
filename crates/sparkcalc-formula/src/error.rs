use sparkcalc_core::ErrorKind;
use thiserror::Error;

/// Malformed formula text. Positions are character offsets into the formula
/// body (after the leading `=`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("empty formula")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid number '{text}' at position {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("invalid cell reference '{text}' at position {pos}")]
    InvalidReference { text: String, pos: usize },

    #[error("unknown name '{name}' at position {pos}")]
    UnknownName { name: String, pos: usize },

    #[error("expected {expected} at position {pos}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
        pos: usize,
    },

    #[error("unexpected {found} at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("comparisons cannot be chained (position {pos})")]
    ChainedComparison { pos: usize },
}

/// Failure of a single-formula preview
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("evaluation error: {0}")]
    Evaluation(ErrorKind),
}

impl FormulaError {
    /// The marker a cell would show for this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Syntax(_) => ErrorKind::SyntaxError,
            FormulaError::Evaluation(kind) => *kind,
        }
    }
}
