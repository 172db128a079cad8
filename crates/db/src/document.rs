//! Document model shared by filters, updates and pipelines.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// A stored record: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Field holding the primary identifier of every document.
pub const ID: &str = "id";

/// Resolve a dotted path to a single value without traversing arrays.
#[must_use]
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Resolve a dotted path, fanning out through arrays.
///
/// `likes.likedBy` over `{"likes": [{"likedBy": "a"}, {"likedBy": "b"}]}`
/// yields `["a", "b"]`. A terminal array contributes its elements.
#[must_use]
pub fn collect_path<'a>(doc: &'a Document, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    if let Some((head, rest)) = segments.split_first()
        && let Some(value) = doc.get(*head)
    {
        walk(value, rest, &mut out);
    }
    out
}

fn walk<'a>(value: &'a Value, rest: &[&str], out: &mut Vec<&'a Value>) {
    if let Value::Array(items) = value {
        for item in items {
            walk(item, rest, out);
        }
        return;
    }

    match rest.split_first() {
        None => out.push(value),
        Some((head, tail)) => {
            if let Some(next) = value.as_object().and_then(|map| map.get(*head)) {
                walk(next, tail, out);
            }
        }
    }
}

/// Equality with numeric normalisation (`1 == 1.0`).
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order over JSON values used by sort stages.
///
/// Values of different types order by type: null, numbers, strings,
/// objects, arrays, booleans.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Whether two values are of comparable type for range operators.
#[must_use]
pub const fn same_kind(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    #[test]
    fn test_get_path_nested() {
        let d = doc(json!({"owner": {"username": "alice"}}));
        assert_eq!(get_path(&d, "owner.username"), Some(&json!("alice")));
        assert_eq!(get_path(&d, "owner.missing"), None);
        assert_eq!(get_path(&d, "nope"), None);
    }

    #[test]
    fn test_collect_path_fans_out() {
        let d = doc(json!({
            "likes": [{"likedBy": "a"}, {"likedBy": "b"}, {"other": 1}],
            "videos": ["v1", "v2"],
        }));
        assert_eq!(collect_path(&d, "likes.likedBy"), vec![&json!("a"), &json!("b")]);
        assert_eq!(collect_path(&d, "videos"), vec![&json!("v1"), &json!("v2")]);
        assert!(collect_path(&d, "missing.path").is_empty());
    }

    #[test]
    fn test_compare_values_mixed_types() {
        assert_eq!(compare_values(&json!(1), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&Value::Null, &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!("z")), Ordering::Greater);
        assert!(values_equal(&json!(3), &json!(3.0)));
    }
}
