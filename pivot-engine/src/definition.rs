//! FILENAME: pivot-engine/src/definition.rs
//! Axis configuration - the description of a pivot table.
//!
//! This module contains the types that DESCRIBE what the caller wants:
//! which attribute fans out into columns, which attributes are reported as
//! group-by keys or aggregated metrics, and how raw values are rendered.
//! Validation of that description lives here; the calculation itself is in
//! `engine`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PivotError;
use rowset::Value;

/// Name of the synthetic column that carries each metric's label.
pub const METRIC_COLUMN: &str = "metric";

/// A caller-supplied display formatter. Takes one raw value and returns the
/// display text, or `None` to keep the cell an explicit absence marker. It
/// must tolerate being invoked with `Value::Empty`.
pub type FormatFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

// ============================================================================
// AGGREGATION
// ============================================================================

/// How a Y-axis attribute participates in the table.
///
/// `GroupBy` is a marker: the attribute identifies a row-group and
/// contributes no aggregated value. Every other variant reduces the sequence
/// of values collected for one cell to a single display value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    GroupBy,
    Sum,
    Count,
    Average,
    Min,
    Max,
}

impl Aggregation {
    pub fn is_group_by(&self) -> bool {
        matches!(self, Aggregation::GroupBy)
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Sum
    }
}

// ============================================================================
// Y-AXIS SPECS
// ============================================================================

/// One reported attribute: what to read from each row, the display label,
/// how to aggregate, and an optional per-cell formatter.
#[derive(Clone, Serialize, Deserialize)]
pub struct YAxisSpec {
    /// Attribute path on the row objects (dotted paths allowed).
    pub attr: String,

    /// Display name shown in the "metric" column. Useful for translation.
    pub label: String,

    /// The kind of operation acted upon the attribute.
    pub aggr: Aggregation,

    /// Applied to the aggregated value before it lands in a cell. Useful for
    /// localizing number formats.
    #[serde(skip)]
    pub format: Option<FormatFn>,
}

impl YAxisSpec {
    pub fn new(attr: impl Into<String>, label: impl Into<String>, aggr: Aggregation) -> Self {
        YAxisSpec {
            attr: attr.into(),
            label: label.into(),
            aggr,
            format: None,
        }
    }

    pub fn with_format(mut self, format: FormatFn) -> Self {
        self.format = Some(format);
        self
    }

    /// The mandatory keys of the original description are struct fields
    /// here; what remains validatable is that none of them is blank.
    pub fn validate(&self) -> Result<(), PivotError> {
        if self.attr.is_empty() {
            return Err(PivotError::EmptyYAxisField("attr"));
        }
        if self.label.is_empty() {
            return Err(PivotError::EmptyYAxisField("label"));
        }
        Ok(())
    }
}

impl fmt::Debug for YAxisSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YAxisSpec")
            .field("attr", &self.attr)
            .field("label", &self.label)
            .field("aggr", &self.aggr)
            .field("format", &self.format.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Group-by attribute paths, in Y-axis declaration order.
pub(crate) fn group_by_attrs(specs: &[YAxisSpec]) -> Vec<&str> {
    specs
        .iter()
        .filter(|s| s.aggr.is_group_by())
        .map(|s| s.attr.as_str())
        .collect()
}

/// Aggregated (non-group) attribute paths, in Y-axis declaration order.
pub(crate) fn metric_attrs(specs: &[YAxisSpec]) -> Vec<&str> {
    specs
        .iter()
        .filter(|s| !s.aggr.is_group_by())
        .map(|s| s.attr.as_str())
        .collect()
}
