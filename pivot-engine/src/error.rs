//! FILENAME: pivot-engine/src/error.rs

use rowset::AttrError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("X-axis attribute '{0}' is not defined in the submitted rows")]
    XAxisNotOnRows(String),

    #[error("X-axis is not defined")]
    XAxisNotDefined,

    #[error("Y-axis is not defined")]
    YAxisNotDefined,

    #[error("a Y-axis entry has an empty '{0}' field")]
    EmptyYAxisField(&'static str),

    #[error("cannot order mixed-type {0} values")]
    Incomparable(&'static str),

    #[error(transparent)]
    Attr(#[from] AttrError),
}
