//! FILENAME: pivot-engine/src/lib.rs
//! Pivot table reshaping engine.
//!
//! This crate turns a flat collection of uniform rows into a pivot table:
//! the distinct values of one chosen attribute (the X-axis) become columns,
//! group-by attributes plus a synthetic "metric" column lead each row, and
//! cells hold an aggregated value per (group, metric, X-value) combination.
//! It depends on `rowset` only for shared types (Value, Record).
//!
//! Layers:
//! - `definition`: Axis configuration (what the pivot table IS)
//! - `engine`: Calculation engine (HOW we calculate)
//! - `view`: Renderable output (WHAT we display)
//! - `error`: Failure taxonomy

pub mod definition;
pub mod engine;
pub mod view;
pub mod error;

pub use definition::{Aggregation, FormatFn, YAxisSpec, METRIC_COLUMN};
pub use engine::PivotTable;
pub use view::{PivotRow, PivotView};
pub use error::PivotError;
