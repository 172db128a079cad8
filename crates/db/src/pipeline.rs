//! Aggregation pipeline stages.
//!
//! A pipeline is an ordered list of [`Stage`]s executed by the store in a
//! single call. Joins are expressed with [`Lookup`], derived fields with
//! [`Expr`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::Filter;

/// One step of an aggregation pipeline.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Keep documents matching the filter.
    Match(Filter),
    /// Join documents from another collection into an array field.
    Lookup(Lookup),
    /// Compute fields from expressions, overwriting existing values.
    Set(Vec<(String, Expr)>),
    /// Keep only the listed top-level fields (the id is always kept).
    Project(Vec<String>),
    /// Remove the listed top-level fields.
    Unset(Vec<String>),
    /// Stable sort by the given keys, in priority order.
    Sort(Vec<SortKey>),
    /// Drop the first `n` documents.
    Skip(u64),
    /// Keep at most `n` documents.
    Limit(u64),
}

/// Join definition: for every input document, collect the documents of
/// `from` whose `foreign_field` equals the value of `local_field`.
///
/// When `local_field` holds an array, each element is looked up and the
/// results keep the array's order. The joined documents run through
/// `pipeline` before being stored under `as_field`.
#[derive(Debug, Clone)]
pub struct Lookup {
    /// Collection to join from.
    pub from: String,
    /// Field on the input document.
    pub local_field: String,
    /// Field on the joined documents.
    pub foreign_field: String,
    /// Output array field.
    pub as_field: String,
    /// Sub-pipeline applied to the joined documents.
    pub pipeline: Vec<Stage>,
}

/// Expression evaluated per document by [`Stage::Set`].
#[derive(Debug, Clone)]
pub enum Expr {
    /// Copy of a (dotted) field, `null` when missing.
    Field(String),
    /// A constant.
    Literal(Value),
    /// Length of an array field, 0 when missing.
    Size(String),
    /// First element of an array field, `null` when empty or missing.
    First(String),
    /// Whether any value reached through the path equals `value`.
    Contains { path: String, value: Value },
    /// Numeric sum of every value reached through the path.
    Sum(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to sort by.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}
