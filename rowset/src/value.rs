//! FILENAME: rowset/src/value.rs
//! The normalized attribute value the engine works with.
//!
//! Rows are opaque to the engine; every attribute lookup is funneled into a
//! `Value`. The type is hashable (NaN values are treated as equal to each
//! other) so values can key hash maps during deduplication and grouping.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};

/// A single attribute value pulled from a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Returns the numeric content, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The default formatter: `Empty` stays an explicit absence marker
    /// instead of becoming a string.
    pub fn display(&self) -> Option<String> {
        match self {
            Value::Empty => None,
            Value::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{:.0}", n))
                } else {
                    Some(format!("{}", n))
                }
            }
            Value::Text(s) => Some(s.clone()),
            Value::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }

    /// Natural ordering within a variant. `Empty` sorts before everything;
    /// values of two different non-empty variants have no defined order and
    /// yield `None`.
    pub fn try_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Empty, Value::Empty) => Some(Ordering::Equal),
            (Value::Empty, _) => Some(Ordering::Less),
            (_, Value::Empty) => Some(Ordering::Greater),
            (Value::Number(a), Value::Number(b)) => {
                Some(a.partial_cmp(b).unwrap_or(Ordering::Equal))
            }
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Empty => 0u8.hash(state),
            Value::Number(n) => {
                1u8.hash(state);
                if n.is_nan() {
                    // All NaN values hash to the same thing
                    u64::MAX.hash(state);
                } else if *n == 0.0 {
                    // 0.0 and -0.0 compare equal, hash them the same
                    0f64.to_bits().hash(state);
                } else {
                    n.to_bits().hash(state);
                }
            }
            Value::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Value::Boolean(b) => {
                3u8.hash(state);
                b.hash(state);
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Empty,
        }
    }
}
