use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::range::CellCoord;

/// Evaluation error markers stored in a cell (Excel-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// #SYNTAX! - Formula text could not be parsed
    SyntaxError,
    /// #DIV/0! - Division or modulo by zero
    DivideByZero,
    /// #VALUE! - Operand has the wrong type
    TypeMismatch,
    /// #REF! - Reference outside the grid
    RefOutOfRange,
    /// #CIRCULAR! - Reference chain revisits a cell being resolved
    CircularReference,
    /// #RANGE! - Range used where a single value is expected
    InvalidRange,
    /// #NAME? - Function name not in the library
    UnknownFunction,
    /// #ARGS! - Wrong number of function arguments
    ArityMismatch,
    /// #NUM! - Numeric domain error or non-finite result
    NumError,
}

impl ErrorKind {
    /// The marker shown in place of a value
    pub fn marker(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "#SYNTAX!",
            ErrorKind::DivideByZero => "#DIV/0!",
            ErrorKind::TypeMismatch => "#VALUE!",
            ErrorKind::RefOutOfRange => "#REF!",
            ErrorKind::CircularReference => "#CIRCULAR!",
            ErrorKind::InvalidRange => "#RANGE!",
            ErrorKind::UnknownFunction => "#NAME?",
            ErrorKind::ArityMismatch => "#ARGS!",
            ErrorKind::NumError => "#NUM!",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Errors raised by host-side grid edits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {coord} is outside the {rows}x{cols} grid")]
    OutOfBounds { coord: CellCoord, rows: u32, cols: u32 },

    #[error("invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("grid must have at least one row and one column")]
    EmptyExtent,
}
