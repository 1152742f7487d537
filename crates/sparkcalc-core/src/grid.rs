use crate::cell::{Cell, Value};
use crate::error::{ErrorKind, GridError};
use crate::range::{CellCoord, CellRange};

/// Default extent used by the spreadsheet view
pub const DEFAULT_ROWS: u32 = 20;
pub const DEFAULT_COLS: u32 = 10;

/// Fixed-size rectangular table of cells, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: u32,
    cols: u32,
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Grid {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cells: vec![Cell::default(); (DEFAULT_ROWS * DEFAULT_COLS) as usize],
        }
    }
}

impl Grid {
    pub fn new(rows: u32, cols: u32) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::EmptyExtent);
        }
        let len = (rows as usize)
            .checked_mul(cols as usize)
            .ok_or(GridError::EmptyExtent)?;

        Ok(Grid {
            rows,
            cols,
            cells: vec![Cell::default(); len],
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// The whole grid as a range
    pub fn extent(&self) -> CellRange {
        CellRange::new(
            CellCoord::new(0, 0),
            CellCoord::new(self.rows - 1, self.cols - 1),
        )
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.row as usize * self.cols as usize + coord.col as usize)
    }

    /// Read-only lookup. Out-of-range coordinates are reported, never a panic.
    pub fn cell(&self, coord: CellCoord) -> Result<&Cell, ErrorKind> {
        self.index(coord)
            .map(|i| &self.cells[i])
            .ok_or(ErrorKind::RefOutOfRange)
    }

    /// Last computed value of a cell
    pub fn value(&self, coord: CellCoord) -> Result<&Value, ErrorKind> {
        self.cell(coord).map(Cell::computed)
    }

    /// Replace a cell's raw text (a user edit)
    pub fn set(&mut self, coord: CellCoord, raw: impl Into<String>) -> Result<(), GridError> {
        let i = self.index(coord).ok_or(GridError::OutOfBounds {
            coord,
            rows: self.rows,
            cols: self.cols,
        })?;
        self.cells[i] = Cell::new(raw);
        Ok(())
    }

    /// Replace a cell's raw text addressed in A1 notation
    pub fn set_a1(&mut self, reference: &str, raw: impl Into<String>) -> Result<(), GridError> {
        let coord = CellCoord::from_a1(reference)
            .ok_or_else(|| GridError::InvalidReference(reference.to_string()))?;
        self.set(coord, raw)
    }

    /// Store a computed value. Out-of-range writes are ignored.
    pub fn store_computed(&mut self, coord: CellCoord, value: Value) {
        if let Some(i) = self.index(coord) {
            self.cells[i].set_computed(value);
        }
    }

    /// All cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let coord = CellCoord::new(i as u32 / cols, i as u32 % cols);
            (coord, cell)
        })
    }

    /// Coordinates of formula cells in row-major order
    pub fn formula_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.iter()
            .filter(|(_, cell)| cell.is_formula())
            .map(|(coord, _)| coord)
    }
}
