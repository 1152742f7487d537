//! Loading stored sheets.
//!
//! Sheets are JSON objects mapping A1 references to raw cell text, either
//! wrapped as `{"cells": {...}, ...}` alongside layout data, or as the older
//! flat `{"A1": "10"}` map. Layout keys are accepted and ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use sparkcalc_core::{CellCoord, Grid};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SheetFile {
    Wrapped { cells: BTreeMap<String, JsonValue> },
    Flat(BTreeMap<String, JsonValue>),
}

impl SheetFile {
    fn into_cells(self) -> BTreeMap<String, JsonValue> {
        match self {
            SheetFile::Wrapped { cells } | SheetFile::Flat(cells) => cells,
        }
    }
}

/// Raw cell text for a stored JSON value
fn raw_text(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => if b { "True" } else { "False" }.to_string(),
        other => other.to_string(),
    }
}

/// Parse sheet JSON into a grid of the given extent. References that do not
/// parse or fall outside the grid are skipped with a warning.
pub fn parse_sheet(json: &str, rows: u32, cols: u32) -> Result<Grid, AppError> {
    let sheet: SheetFile = serde_json::from_str(json)?;
    let mut grid = Grid::new(rows, cols)?;

    for (reference, value) in sheet.into_cells() {
        let Some(coord) = CellCoord::from_a1(&reference) else {
            tracing::warn!("Skipping invalid cell reference {:?}", reference);
            continue;
        };
        if !grid.contains(coord) {
            tracing::warn!("Skipping {} outside the {}x{} grid", coord, rows, cols);
            continue;
        }
        grid.set(coord, raw_text(value))?;
    }

    Ok(grid)
}

/// Read and parse a sheet file
pub fn load_sheet(path: &Path, rows: u32, cols: u32) -> Result<Grid, AppError> {
    let json = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Loaded {} ({} bytes)", path.display(), json.len());
    parse_sheet(&json, rows, cols)
}
