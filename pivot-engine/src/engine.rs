//! FILENAME: pivot-engine/src/engine.rs
//! Pivot engine - the calculation core that reshapes rows into a table.
//!
//! This module takes the axis configuration plus the row collection and
//! produces (a) the ordered header row and (b) the full result matrix.
//!
//! Algorithm:
//! 1. Derive the leading key columns from the group-by attributes and the
//!    optional group-key order, then append "metric" and the distinct
//!    X-axis values
//! 2. Project every row onto its group-key tuple and sort the distinct
//!    tuples lexicographically
//! 3. For each (group key, metric) pair, emit one output row and fill its
//!    X-value cells from the rows of that group, reducing each cell's
//!    collected values through the metric's aggregation
//!
//! Headers and result are derived views: both are recomputed from the
//! current configuration and rows on every call, never cached.

use std::cmp::Ordering;
use std::fmt;
use std::mem::{discriminant, Discriminant};

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::definition::{self, Aggregation, FormatFn, YAxisSpec, METRIC_COLUMN};
use crate::error::PivotError;
use crate::view::{PivotRow, PivotView};
use rowset::{resolve_path, Record, Value};

/// A row's projection onto the group-key attributes.
type GroupKey = SmallVec<[Value; 4]>;

// ============================================================================
// PIVOT TABLE
// ============================================================================

/// The pivot table: rows plus axis configuration.
///
/// All configuration is per instance and validated eagerly at assignment;
/// `headers` and `result` fail fast if the configuration is incomplete.
/// Computation is single-threaded and synchronous; sharing an instance
/// across threads must be serialized externally.
pub struct PivotTable<R: Record> {
    rows: Vec<R>,
    xaxis: Option<String>,
    yaxis: Option<Vec<YAxisSpec>>,
    yaxis_order: Option<Vec<String>>,
    xaxis_sort: bool,
    xaxis_format: Option<FormatFn>,
}

impl<R: Record> PivotTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        PivotTable {
            rows,
            xaxis: None,
            yaxis: None,
            yaxis_order: None,
            xaxis_sort: true,
            xaxis_format: None,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Replaces the row collection. The X-axis is not re-validated here;
    /// a row missing the attribute surfaces on the next derived access.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
    }

    pub fn xaxis(&self) -> Option<&str> {
        self.xaxis.as_deref()
    }

    /// Selects the attribute whose distinct values become table columns.
    /// Fails if any row lacks the attribute; on failure the previously
    /// configured X-axis is retained unchanged.
    pub fn set_xaxis(&mut self, name: &str) -> Result<(), PivotError> {
        for row in &self.rows {
            if resolve_path(row, name).is_err() {
                return Err(PivotError::XAxisNotOnRows(name.to_string()));
            }
        }
        self.xaxis = Some(name.to_string());
        Ok(())
    }

    pub fn yaxis(&self) -> Option<&[YAxisSpec]> {
        self.yaxis.as_deref()
    }

    /// Declares the reported attributes. Attribute existence on the rows is
    /// not checked here; a missing attribute is a lookup fault at result
    /// time. On validation failure the Y-axis is left unchanged.
    pub fn set_yaxis(&mut self, specs: Vec<YAxisSpec>) -> Result<(), PivotError> {
        for spec in &specs {
            spec.validate()?;
        }
        self.yaxis = Some(specs);
        Ok(())
    }

    /// Orders the group-by attributes: which become the leading key columns
    /// and how output row blocks are sorted and tie-broken.
    pub fn set_yaxis_order(&mut self, order: Vec<String>) {
        self.yaxis_order = Some(order);
    }

    pub fn clear_yaxis_order(&mut self) {
        self.yaxis_order = None;
    }

    /// Whether the X-value columns are sorted ascending (default) or left in
    /// first-seen order.
    pub fn set_xaxis_sort(&mut self, sort: bool) {
        self.xaxis_sort = sort;
    }

    /// Formatter applied to the pivoted column headers. Useful for
    /// localization, e.g. rendering date columns as "Jan-10".
    pub fn set_xaxis_format(&mut self, format: FormatFn) {
        self.xaxis_format = Some(format);
    }

    /// Group-by attribute paths, in Y-axis declaration order.
    pub fn group_by_attrs(&self) -> Result<Vec<&str>, PivotError> {
        let yaxis = self.yaxis.as_ref().ok_or(PivotError::YAxisNotDefined)?;
        Ok(definition::group_by_attrs(yaxis))
    }

    /// Aggregated attribute paths, in Y-axis declaration order.
    pub fn metric_attrs(&self) -> Result<Vec<&str>, PivotError> {
        let yaxis = self.yaxis.as_ref().ok_or(PivotError::YAxisNotDefined)?;
        Ok(definition::metric_attrs(yaxis))
    }

    /// The ordered header row: group-key columns, "metric", then the
    /// distinct X-axis values.
    pub fn headers(&self) -> Result<Vec<Value>, PivotError> {
        Ok(self.header_layout()?.headers())
    }

    /// Builds the full result matrix. Headers are recomputed as part of
    /// this call, so the output is always consistent with the latest
    /// configuration. The first row of the view is the formatted header row.
    pub fn result(&self) -> Result<PivotView, PivotError> {
        let layout = self.header_layout()?;
        let xaxis = self.xaxis.as_ref().ok_or(PivotError::XAxisNotDefined)?;
        let yaxis = self.yaxis.as_ref().ok_or(PivotError::YAxisNotDefined)?;
        let order: &[String] = self.yaxis_order.as_deref().unwrap_or(&[]);

        let width = layout.width();
        let leading = layout.leading_len();
        let metric_col = layout.metric_col();

        // Header cells: X-value headers go through the configured formatter,
        // key columns and "metric" pass through unformatted.
        let mut header_row: PivotRow = Vec::with_capacity(width);
        for (i, header) in layout.headers().iter().enumerate() {
            if i < leading {
                header_row.push(header.display());
            } else {
                header_row.push(self.format_header(header));
            }
        }

        // Column index of every distinct X value.
        let x_col: FxHashMap<&Value, usize> = layout
            .x_values
            .iter()
            .enumerate()
            .map(|(i, v)| (v, leading + i))
            .collect();

        // Project every row onto its group-key tuple. An empty order means
        // one implicit group holding all rows.
        let mut groups: FxHashMap<GroupKey, Vec<usize>> = FxHashMap::default();
        let mut distinct: Vec<GroupKey> = Vec::new();
        for (idx, row) in self.rows.iter().enumerate() {
            let key: GroupKey = order
                .iter()
                .map(|attr| resolve_path(row, attr))
                .collect::<Result<_, _>>()?;
            if let Some(members) = groups.get_mut(&key) {
                members.push(idx);
            } else {
                groups.insert(key.clone(), vec![idx]);
                distinct.push(key);
            }
        }
        sort_group_keys(&mut distinct)?;

        // Positions of the ordered key attributes among the key columns.
        // An order entry without a matching column is grouped on but not shown.
        let col_of_key: Vec<Option<usize>> = order
            .iter()
            .map(|attr| layout.key_columns.iter().position(|c| c == attr))
            .collect();

        let metric_specs: Vec<&YAxisSpec> =
            yaxis.iter().filter(|s| !s.aggr.is_group_by()).collect();

        let mut rows_out: Vec<PivotRow> =
            Vec::with_capacity(1 + distinct.len() * metric_specs.len());
        rows_out.push(header_row);

        for key in &distinct {
            let base = rows_out.len();
            for spec in &metric_specs {
                let mut out: PivotRow = vec![None; width];
                for (ki, kv) in key.iter().enumerate() {
                    if let Some(col) = col_of_key[ki] {
                        out[col] = kv.display();
                    }
                }
                out[metric_col] = Some(spec.label.clone());
                rows_out.push(out);
            }

            // One accumulator per addressed (metric, X value) cell.
            let mut cells: Vec<FxHashMap<usize, Accumulator>> =
                vec![FxHashMap::default(); metric_specs.len()];
            for &row_idx in &groups[key] {
                let row = &self.rows[row_idx];
                let x_value = resolve_path(row, xaxis)?;
                let col = match x_col.get(&x_value) {
                    Some(&col) => col,
                    None => continue,
                };
                for (mi, spec) in metric_specs.iter().enumerate() {
                    let raw = resolve_path(row, &spec.attr)?;
                    cells[mi].entry(col).or_default().append(raw);
                }
            }

            for (mi, spec) in metric_specs.iter().enumerate() {
                for (&col, acc) in &cells[mi] {
                    let reduced = acc.reduce(spec.aggr);
                    rows_out[base + mi][col] = match &spec.format {
                        Some(format) => format(&reduced),
                        None => reduced.display(),
                    };
                }
            }
        }

        Ok(PivotView::new(rows_out))
    }

    fn format_header(&self, value: &Value) -> Option<String> {
        match &self.xaxis_format {
            Some(format) => format(value),
            None => value.display(),
        }
    }

    /// Derives the key columns and the distinct X values.
    fn header_layout(&self) -> Result<HeaderLayout, PivotError> {
        let xaxis = self.xaxis.as_ref().ok_or(PivotError::XAxisNotDefined)?;

        // Distinct X values, first-seen order.
        let mut seen: FxHashSet<Value> = FxHashSet::default();
        let mut x_values: Vec<Value> = Vec::new();
        for row in &self.rows {
            let value = resolve_path(row, xaxis)?;
            if seen.insert(value.clone()) {
                x_values.push(value);
            }
        }
        if self.xaxis_sort {
            ensure_comparable(x_values.iter(), "X-axis")?;
            x_values.sort_by(|a, b| a.try_cmp(b).unwrap_or(Ordering::Equal));
        }

        let group_by = self.group_by_attrs()?;
        let order: &[String] = self.yaxis_order.as_deref().unwrap_or(&[]);

        // Group-by attributes aligned to their declared order positions;
        // order entries with no matching group-by attribute are dropped.
        let mut key_columns: Vec<String> = order
            .iter()
            .filter(|o| group_by.contains(&o.as_str()))
            .cloned()
            .collect();
        // Group-by attributes outside the order become standalone leading
        // columns, not used for row tie-breaking.
        for attr in &group_by {
            if !order.iter().any(|o| o == attr) {
                key_columns.push((*attr).to_string());
            }
        }

        Ok(HeaderLayout {
            key_columns,
            x_values,
        })
    }
}

impl<R: Record> fmt::Debug for PivotTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PivotTable")
            .field("rows", &self.rows.len())
            .field("xaxis", &self.xaxis)
            .field("yaxis", &self.yaxis)
            .field("yaxis_order", &self.yaxis_order)
            .field("xaxis_sort", &self.xaxis_sort)
            .field("xaxis_format", &self.xaxis_format.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// ============================================================================
// HEADER LAYOUT
// ============================================================================

/// Column structure of one computation: the leading key columns and the
/// distinct X values, in final display order.
struct HeaderLayout {
    key_columns: Vec<String>,
    x_values: Vec<Value>,
}

impl HeaderLayout {
    fn has_metric_key(&self) -> bool {
        self.key_columns.iter().any(|c| c == METRIC_COLUMN)
    }

    /// Column index of the "metric" column.
    fn metric_col(&self) -> usize {
        self.key_columns
            .iter()
            .position(|c| c == METRIC_COLUMN)
            .unwrap_or(self.key_columns.len())
    }

    /// Number of leading columns (key columns plus "metric").
    fn leading_len(&self) -> usize {
        self.key_columns.len() + usize::from(!self.has_metric_key())
    }

    fn width(&self) -> usize {
        self.leading_len() + self.x_values.len()
    }

    fn headers(&self) -> Vec<Value> {
        let mut headers: Vec<Value> = self
            .key_columns
            .iter()
            .map(|c| Value::Text(c.clone()))
            .collect();
        if !self.has_metric_key() {
            headers.push(Value::Text(METRIC_COLUMN.to_string()));
        }
        headers.extend(self.x_values.iter().cloned());
        headers
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Values are ordered only within one variant; mixing, say, numbers and
/// text on an axis that must be sorted is a configuration error, not an
/// arbitrary order.
fn ensure_comparable<'a>(
    values: impl Iterator<Item = &'a Value>,
    what: &'static str,
) -> Result<(), PivotError> {
    let mut kind: Option<Discriminant<Value>> = None;
    for value in values {
        if value.is_empty() {
            continue;
        }
        let d = discriminant(value);
        match kind {
            None => kind = Some(d),
            Some(k) if k == d => {}
            Some(_) => return Err(PivotError::Incomparable(what)),
        }
    }
    Ok(())
}

/// Sorts group-key tuples lexicographically, ties broken left to right.
fn sort_group_keys(keys: &mut [GroupKey]) -> Result<(), PivotError> {
    let positions = keys.first().map_or(0, |k| k.len());
    for i in 0..positions {
        ensure_comparable(keys.iter().map(|k| &k[i]), "group key")?;
    }
    keys.sort_by(|a, b| {
        for (x, y) in a.iter().zip(b.iter()) {
            match x.try_cmp(y).unwrap_or(Ordering::Equal) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    });
    Ok(())
}

// ============================================================================
// CELL ACCUMULATOR
// ============================================================================

/// Collects the raw values addressed to one cell, then reduces them to a
/// single display value through the metric's aggregation.
#[derive(Debug, Clone, Default)]
struct Accumulator {
    values: Vec<Value>,
}

impl Accumulator {
    fn append(&mut self, value: Value) {
        self.values.push(value);
    }

    fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(Value::as_number)
    }

    fn reduce(&self, aggr: Aggregation) -> Value {
        match aggr {
            // Markers never reach cells
            Aggregation::GroupBy => Value::Empty,
            Aggregation::Sum => {
                let mut sum = 0.0;
                let mut any = false;
                for n in self.numbers() {
                    sum += n;
                    any = true;
                }
                if any {
                    Value::Number(sum)
                } else {
                    // A cell fed only non-numeric values keeps the last one
                    self.last_scalar()
                }
            }
            Aggregation::Count => {
                Value::Number(self.values.iter().filter(|v| !v.is_empty()).count() as f64)
            }
            Aggregation::Average => {
                let mut sum = 0.0;
                let mut count = 0u64;
                for n in self.numbers() {
                    sum += n;
                    count += 1;
                }
                if count > 0 {
                    Value::Number(sum / count as f64)
                } else {
                    Value::Empty
                }
            }
            Aggregation::Min => self.fold_numbers(f64::min),
            Aggregation::Max => self.fold_numbers(f64::max),
        }
    }

    fn fold_numbers(&self, pick: fn(f64, f64) -> f64) -> Value {
        self.numbers()
            .fold(None, |acc, n| Some(acc.map_or(n, |c| pick(c, n))))
            .map(Value::Number)
            .unwrap_or(Value::Empty)
    }

    fn last_scalar(&self) -> Value {
        self.values
            .iter()
            .rev()
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or(Value::Empty)
    }
}
