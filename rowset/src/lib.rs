//! FILENAME: rowset/src/lib.rs
//! Shared row-data types for the pivot engine.
//!
//! This crate defines the data model the engine operates on, separate from
//! the calculation logic. `pivot-engine` depends on it only for shared types
//! (Value, Record, path resolution).
//!
//! Layers:
//! - `value`: Normalized, hashable attribute values
//! - `record`: The row supplier contract and dotted-path resolution

pub mod value;
pub mod record;

pub use value::Value;
pub use record::{Attr, AttrError, DynRecord, Record, resolve_path};
