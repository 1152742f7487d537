pub mod cell;
pub mod error;
pub mod grid;
pub mod range;
pub mod timestamp;

pub use cell::{is_formula_text, Cell, Value};
pub use error::{ErrorKind, GridError};
pub use grid::{Grid, DEFAULT_COLS, DEFAULT_ROWS};
pub use range::{col_from_label, col_to_label, CellCoord, CellRange};
