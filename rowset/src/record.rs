//! FILENAME: rowset/src/record.rs
//! The row supplier contract.
//!
//! The engine never inspects a row's type: all it needs is attribute lookup
//! by name, including dotted paths (`team.city.name`) resolved segment by
//! segment. Callers implement `Record` on their own row structs, or build
//! rows dynamically with `DynRecord`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

/// Failure while resolving an attribute path against a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttrError {
    #[error("attribute '{segment}' not found while resolving '{path}'")]
    Missing { path: String, segment: String },

    #[error("segment '{segment}' of '{path}' is a plain value, not a nested record")]
    NotNested { path: String, segment: String },

    #[error("path '{path}' resolves to a nested record, not a value")]
    NotScalar { path: String },
}

/// The result of a single-segment attribute lookup: either a terminal value
/// or a nested record the next segment resolves against.
pub enum Attr<'a> {
    Value(Value),
    Nested(&'a dyn Record),
}

/// Attribute lookup by name. The only thing the engine requires of a row.
pub trait Record {
    fn attr(&self, name: &str) -> Option<Attr<'_>>;
}

/// Resolves a dotted attribute path against a record, one segment at a time.
/// Any missing segment is a lookup fault, propagated as-is.
pub fn resolve_path(record: &dyn Record, path: &str) -> Result<Value, AttrError> {
    let mut current = record;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        match current.attr(segment) {
            None => {
                return Err(AttrError::Missing {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            }
            Some(Attr::Value(value)) => {
                if segments.peek().is_some() {
                    return Err(AttrError::NotNested {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
                return Ok(value);
            }
            Some(Attr::Nested(nested)) => {
                if segments.peek().is_none() {
                    return Err(AttrError::NotScalar {
                        path: path.to_string(),
                    });
                }
                current = nested;
            }
        }
    }

    // split('.') always yields at least one segment
    Err(AttrError::Missing {
        path: path.to_string(),
        segment: String::new(),
    })
}

/// A field stored in a `DynRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    Value(Value),
    Nested(DynRecord),
}

/// A map-backed record for callers without a concrete row struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynRecord {
    fields: FxHashMap<String, Field>,
}

impl DynRecord {
    pub fn new() -> Self {
        DynRecord {
            fields: FxHashMap::default(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Field::Value(value.into()));
        self
    }

    /// Builder-style nested record assignment.
    pub fn with_nested(mut self, name: impl Into<String>, nested: DynRecord) -> Self {
        self.fields.insert(name.into(), Field::Nested(nested));
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), Field::Value(value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Record for DynRecord {
    fn attr(&self, name: &str) -> Option<Attr<'_>> {
        match self.fields.get(name) {
            Some(Field::Value(value)) => Some(Attr::Value(value.clone())),
            Some(Field::Nested(nested)) => Some(Attr::Nested(nested)),
            None => None,
        }
    }
}
