pub mod config;
pub mod error;
pub mod sheet_file;

use std::collections::BTreeMap;

use serde::Serialize;
use sparkcalc_core::{col_to_label, CellCoord, Grid, Value};

pub use config::Config;
pub use error::AppError;
pub use sheet_file::{load_sheet, parse_sheet};

/// Bottom-right corner of the non-blank area, if any cell is filled
fn used_extent(grid: &Grid) -> Option<CellCoord> {
    grid.iter()
        .filter(|(_, cell)| !cell.is_blank())
        .map(|(coord, _)| coord)
        .reduce(|a, b| CellCoord::new(a.row.max(b.row), a.col.max(b.col)))
}

/// Plain-text table of computed values over the used area
pub fn render_table(grid: &Grid) -> String {
    let Some(last) = used_extent(grid) else {
        return String::new();
    };

    let header: Vec<String> = (0..=last.col).map(col_to_label).collect();
    let rows: Vec<Vec<String>> = (0..=last.row)
        .map(|row| {
            (0..=last.col)
                .map(|col| {
                    grid.cell(CellCoord::new(row, col))
                        .map(|cell| cell.display())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let gutter = (last.row + 1).to_string().len();

    let mut out = String::new();
    out.push_str(&" ".repeat(gutter));
    for (label, width) in header.iter().zip(&widths) {
        out.push_str(&format!(" | {:<width$}", label, width = width));
    }
    out.push('\n');

    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!("{:>gutter$}", i + 1, gutter = gutter));
        for (text, width) in row.iter().zip(&widths) {
            out.push_str(&format!(" | {:<width$}", text, width = width));
        }
        out.push('\n');
    }

    out
}

#[derive(Debug, Serialize)]
struct RenderedCell<'a> {
    raw: &'a str,
    display: String,
    value: &'a Value,
}

/// JSON object of every non-blank cell keyed by A1 reference
pub fn render_json(grid: &Grid) -> Result<String, AppError> {
    let cells: BTreeMap<String, RenderedCell<'_>> = grid
        .iter()
        .filter(|(_, cell)| !cell.is_blank())
        .map(|(coord, cell)| {
            let rendered = RenderedCell {
                raw: cell.raw(),
                display: cell.display(),
                value: cell.computed(),
            };
            (coord.to_a1(), rendered)
        })
        .collect();

    Ok(serde_json::to_string_pretty(&cells)?)
}
