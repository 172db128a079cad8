//! Single-document update operators.

use serde_json::Value;

use crate::document::{Document, values_equal};
use crate::error::{StoreError, StoreResult};

/// An update operator applied to one top-level field.
///
/// All operators in one `update_one` call are applied atomically.
#[derive(Debug, Clone)]
pub enum Update {
    /// Replace the field value.
    Set(String, Value),
    /// Remove the field.
    Unset(String),
    /// Add to a numeric field, treating a missing field as zero.
    Inc(String, i64),
    /// Append to an array field unless an equal element is present.
    AddToSet(String, Value),
    /// Remove every equal element from an array field.
    Pull(String, Value),
    /// Negate a boolean field, treating a missing field as `false`.
    Flip(String),
}

impl Update {
    /// Replace `field` with `value`.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set(field.into(), value.into())
    }

    /// Add `value` to the set stored in `field`.
    pub fn add_to_set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::AddToSet(field.into(), value.into())
    }

    /// Remove `value` from the array stored in `field`.
    pub fn pull(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Pull(field.into(), value.into())
    }

    /// Increment `field` by `by`.
    pub fn inc(field: impl Into<String>, by: i64) -> Self {
        Self::Inc(field.into(), by)
    }

    /// Negate the boolean stored in `field`.
    pub fn flip(field: impl Into<String>) -> Self {
        Self::Flip(field.into())
    }

    pub(crate) fn apply(&self, doc: &mut Document) -> StoreResult<()> {
        match self {
            Self::Set(field, value) => {
                doc.insert(field.clone(), value.clone());
            }
            Self::Unset(field) => {
                doc.remove(field);
            }
            Self::Inc(field, by) => {
                let current = match doc.get(field) {
                    None | Some(Value::Null) => 0,
                    Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(field, "not an integer"))?,
                    Some(_) => return Err(invalid(field, "not a number")),
                };
                doc.insert(field.clone(), Value::from(current.saturating_add(*by)));
            }
            Self::AddToSet(field, value) => {
                let slot = doc.entry(field.clone()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = Value::Array(Vec::new());
                }
                let items = slot
                    .as_array_mut()
                    .ok_or_else(|| invalid(field, "not an array"))?;
                if !items.iter().any(|item| values_equal(item, value)) {
                    items.push(value.clone());
                }
            }
            Self::Pull(field, value) => match doc.get_mut(field) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => items.retain(|item| !values_equal(item, value)),
                Some(_) => return Err(invalid(field, "not an array")),
            },
            Self::Flip(field) => {
                let current = match doc.get(field) {
                    None | Some(Value::Null) => false,
                    Some(Value::Bool(b)) => *b,
                    Some(_) => return Err(invalid(field, "not a boolean")),
                };
                doc.insert(field.clone(), Value::Bool(!current));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> StoreError {
    StoreError::InvalidUpdate {
        field: field.to_string(),
        message: message.to_string(),
    }
}
