//! Whole-grid recalculation.
//!
//! A pass visits every non-blank cell in row-major order with a single
//! [`Evaluator`], so each formula is computed once and all TODAY()/NOW()
//! calls see the same instant. Results are written back only after every cell
//! has been computed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sparkcalc_core::{CellCoord, Grid, Value};

use crate::evaluator::Evaluator;

/// Outcome of a recalculation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecalcSummary {
    /// Formula cells evaluated
    pub formulas: usize,
    /// Formula cells whose value is an error, including errors passed on by
    /// a referenced cell
    pub errors: usize,
    /// Cells that sit on a reference loop themselves
    pub circular: usize,
}

/// Evaluate every non-blank cell; also report how many cells formed loops
fn run_pass(grid: &Grid, now: DateTime<Utc>) -> (HashMap<CellCoord, Value>, usize) {
    let mut evaluator = Evaluator::at(grid, now);

    let values = grid
        .iter()
        .filter(|(_, cell)| !cell.is_blank())
        .map(|(coord, _)| (coord, evaluator.resolve_cell(coord)))
        .collect();

    (values, evaluator.cyclic_cells().len())
}

/// Values of every non-blank cell, computed without touching the grid
pub fn compute_all(grid: &Grid) -> HashMap<CellCoord, Value> {
    compute_all_at(grid, Utc::now())
}

/// Like [`compute_all`], with a fixed clock for TODAY()/NOW()
pub fn compute_all_at(grid: &Grid, now: DateTime<Utc>) -> HashMap<CellCoord, Value> {
    run_pass(grid, now).0
}

/// Recompute every cell of the grid in place
pub fn recalculate(grid: &mut Grid) -> RecalcSummary {
    recalculate_at(grid, Utc::now())
}

/// Like [`recalculate`], with a fixed clock for TODAY()/NOW()
pub fn recalculate_at(grid: &mut Grid, now: DateTime<Utc>) -> RecalcSummary {
    tracing::debug!("Recalculating {}x{} grid", grid.rows(), grid.cols());

    let (mut values, circular) = run_pass(grid, now);
    let mut summary = RecalcSummary {
        circular,
        ..RecalcSummary::default()
    };

    for coord in grid.formula_cells() {
        summary.formulas += 1;
        if values.get(&coord).is_some_and(|v| v.error().is_some()) {
            summary.errors += 1;
        }
    }

    for coord in grid.extent().iter() {
        grid.store_computed(coord, values.remove(&coord).unwrap_or_default());
    }

    if summary.circular > 0 {
        tracing::warn!("{} cells form circular references", summary.circular);
    }
    tracing::debug!(
        "Recalculated {} formulas, {} errors",
        summary.formulas,
        summary.errors
    );

    summary
}
