//! Predicate algebra evaluated against documents.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::document::{self, Document, collect_path, compare_values, same_kind, values_equal};
use crate::error::{StoreError, StoreResult};

/// A predicate over documents.
///
/// Field names are dotted paths. A path that crosses an array matches when
/// any element matches, so `Eq("videos", id)` finds playlists containing `id`.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals value. A `null` value also matches a missing field.
    Eq(String, Value),
    /// Negation of [`Filter::Eq`].
    Ne(String, Value),
    /// Field equals any of the values.
    In(String, Vec<Value>),
    /// Field is present (or absent when `false`).
    Exists(String, bool),
    /// Field is strictly greater than a value of the same type.
    Gt(String, Value),
    /// Field is strictly less than a value of the same type.
    Lt(String, Value),
    /// Case-insensitive pattern match on a string field.
    Text(String, Regex),
    /// All sub-filters match.
    And(Vec<Filter>),
    /// At least one sub-filter matches.
    Or(Vec<Filter>),
    /// The sub-filter does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// `field != value`.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    /// `field in values`.
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Match a document by its primary id.
    pub fn id(id: impl Into<String>) -> Self {
        Self::Eq(document::ID.to_string(), Value::String(id.into()))
    }

    /// Case-insensitive substring search OR-combined across `fields`.
    ///
    /// The needle is escaped, so user input is matched literally.
    pub fn contains_text(fields: &[&str], needle: &str) -> StoreResult<Self> {
        let pattern = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::InvalidFilter(e.to_string()))?;

        Ok(Self::Or(
            fields
                .iter()
                .map(|field| Self::Text((*field).to_string(), pattern.clone()))
                .collect(),
        ))
    }

    /// Conjunction that drops `All` terms and flattens nested conjunctions.
    pub fn and<I>(filters: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut terms = Vec::new();
        for filter in filters {
            match filter {
                Self::All => {}
                Self::And(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }

        match terms.len() {
            0 => Self::All,
            1 => terms.pop().unwrap_or(Self::All),
            _ => Self::And(terms),
        }
    }

    /// Disjunction of `filters`.
    pub fn or<I>(filters: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::Or(filters.into_iter().collect())
    }

    /// Conjoin `other` onto this filter.
    #[must_use]
    pub fn with(self, other: Self) -> Self {
        Self::and([self, other])
    }

    /// Evaluate the filter against `doc`.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, value) => eq_matches(doc, field, value),
            Self::Ne(field, value) => !eq_matches(doc, field, value),
            Self::In(field, values) => values.iter().any(|v| eq_matches(doc, field, v)),
            Self::Exists(field, wanted) => !collect_path(doc, field).is_empty() == *wanted,
            Self::Gt(field, value) => collect_path(doc, field)
                .into_iter()
                .any(|c| same_kind(c, value) && compare_values(c, value).is_gt()),
            Self::Lt(field, value) => collect_path(doc, field)
                .into_iter()
                .any(|c| same_kind(c, value) && compare_values(c, value).is_lt()),
            Self::Text(field, pattern) => collect_path(doc, field)
                .into_iter()
                .any(|c| c.as_str().is_some_and(|s| pattern.is_match(s))),
            Self::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Self::Not(inner) => !inner.matches(doc),
        }
    }
}

fn eq_matches(doc: &Document, field: &str, value: &Value) -> bool {
    let candidates = collect_path(doc, field);
    if candidates.is_empty() {
        return value.is_null();
    }
    candidates.into_iter().any(|c| values_equal(c, value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_eq_null_matches_missing_and_null() {
        let like = doc(json!({"likedBy": "u1", "video": "v1", "tweet": null}));
        assert!(Filter::eq("tweet", Value::Null).matches(&like));
        assert!(Filter::eq("comment", Value::Null).matches(&like));
        assert!(!Filter::eq("video", Value::Null).matches(&like));
    }

    #[test]
    fn test_eq_on_array_field_means_membership() {
        let playlist = doc(json!({"videos": ["v1", "v2"]}));
        assert!(Filter::eq("videos", "v2").matches(&playlist));
        assert!(!Filter::eq("videos", "v3").matches(&playlist));
    }

    #[test]
    fn test_contains_text_is_case_insensitive_and_literal() {
        let video = doc(json!({"title": "Rust Ownership (Part 1)", "description": "borrowck"}));
        let filter = Filter::contains_text(&["title", "description"], "ownership (part").unwrap();
        assert!(filter.matches(&video));

        let by_description = Filter::contains_text(&["title", "description"], "BORROW").unwrap();
        assert!(by_description.matches(&video));

        let regex_chars = Filter::contains_text(&["title"], ".*").unwrap();
        assert!(!regex_chars.matches(&video));
    }

    #[test]
    fn test_and_flattens_and_drops_all() {
        let filter = Filter::and([
            Filter::All,
            Filter::and([Filter::eq("a", 1), Filter::eq("b", 2)]),
            Filter::eq("c", 3),
        ]);
        match filter {
            Filter::And(terms) => assert_eq!(terms.len(), 3),
            other => panic!("unexpected filter {other:?}"),
        }
        assert!(matches!(Filter::and([Filter::All]), Filter::All));
    }

    #[test]
    fn test_range_and_logic() {
        let video = doc(json!({"views": 10, "isPublished": false, "owner": "u1"}));
        assert!(Filter::Gt("views".into(), json!(5)).matches(&video));
        assert!(!Filter::Lt("views".into(), json!(5)).matches(&video));
        assert!(!Filter::Gt("views".into(), json!("5")).matches(&video));

        let visible_to_u1 = Filter::or([Filter::eq("isPublished", true), Filter::eq("owner", "u1")]);
        let visible_to_u2 = Filter::or([Filter::eq("isPublished", true), Filter::eq("owner", "u2")]);
        assert!(visible_to_u1.matches(&video));
        assert!(!visible_to_u2.matches(&video));
        assert!(Filter::Not(Box::new(visible_to_u2)).matches(&video));
    }
}
