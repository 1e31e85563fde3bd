//! FILENAME: pivot-engine/src/view.rs
//! Pivot view - the renderable output.
//!
//! A finished matrix of display cells. The first row is the formatted header
//! row; every following row is one (group-key combination, metric) pair with
//! one cell per X-value column. `None` is the explicit absence marker for a
//! cell no input row supplied.
//!
//! The view is an owned snapshot: nothing the caller does with it reaches
//! back into the engine's state.

use serde::{Deserialize, Serialize};

/// One output row: a cell per column, `None` where no value applies.
pub type PivotRow = Vec<Option<String>>;

/// The full result matrix, header row first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotView {
    rows: Vec<PivotRow>,
}

impl PivotView {
    pub(crate) fn new(rows: Vec<PivotRow>) -> Self {
        PivotView { rows }
    }

    /// The formatted header row, when the view is non-empty.
    pub fn header(&self) -> Option<&PivotRow> {
        self.rows.first()
    }

    /// Every row after the header.
    pub fn data_rows(&self) -> &[PivotRow] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    /// Number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PivotRow> {
        self.rows.iter()
    }
}

impl IntoIterator for PivotView {
    type Item = PivotRow;
    type IntoIter = std::vec::IntoIter<PivotRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a PivotView {
    type Item = &'a PivotRow;
    type IntoIter = std::slice::Iter<'a, PivotRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
