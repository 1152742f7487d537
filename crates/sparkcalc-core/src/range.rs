use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based cell coordinate
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    pub const fn new(row: u32, col: u32) -> Self {
        CellCoord { row, col }
    }

    /// Parse A1 notation, case-insensitive ("b2" -> row 1, col 1)
    pub fn from_a1(notation: &str) -> Option<Self> {
        let notation = notation.trim();
        let split = notation
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(notation.len());
        let (letters, digits) = notation.split_at(split);

        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let col = col_from_label(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }

        Some(CellCoord::new(row - 1, col))
    }

    /// Format as A1 notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", col_to_label(self.col), self.row + 1)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_label(self.col), self.row + 1)
    }
}

/// Column index to label: 0 -> A, 25 -> Z, 26 -> AA
pub fn col_to_label(col: u32) -> String {
    let mut bytes = Vec::new();
    let mut n = u64::from(col) + 1;

    while n > 0 {
        n -= 1;
        bytes.push(b'A' + (n % 26) as u8);
        n /= 26;
    }

    bytes.reverse();
    String::from_utf8(bytes).unwrap_or_default()
}

/// Column label to index, case-insensitive. Returns `None` on overflow or non-letters.
pub fn col_from_label(label: &str) -> Option<u32> {
    if label.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }

    Some(col - 1)
}

/// Rectangle of cells, normalized so `start` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// Build a range from two corners given in any order
    pub fn new(a: CellCoord, b: CellCoord) -> Self {
        CellRange {
            start: CellCoord::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellCoord::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Coordinates in row-major order
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellCoord::new(row, col)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
