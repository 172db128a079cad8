//! In-process [`DocumentStore`] implementation.
//!
//! Every call takes the store lock once, so each call is a single atomic
//! round trip: a pipeline sees one consistent snapshot of all collections,
//! and a write either fully applies or leaves the store untouched.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Number, Value};
use tokio::sync::RwLock;

use crate::document::{
    Document, ID, collect_path, compare_values, get_path, values_equal,
};
use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::pipeline::{Expr, Lookup, SortDirection, SortKey, Stage};
use crate::store::DocumentStore;
use crate::update::Update;

type Collections = HashMap<String, Collection>;

#[derive(Debug, Default)]
struct Collection {
    docs: Vec<Document>,
    unique: Vec<Vec<String>>,
}

impl Collection {
    /// Check the document at `idx` against every other document.
    fn check_unique(&self, name: &str, idx: usize) -> StoreResult<()> {
        let Some(candidate) = self.docs.get(idx) else {
            return Ok(());
        };

        let id_index = vec![ID.to_string()];
        for fields in std::iter::once(&id_index).chain(self.unique.iter()) {
            let key = index_key(fields, candidate);
            let clash = self
                .docs
                .iter()
                .enumerate()
                .any(|(i, other)| i != idx && keys_equal(&index_key(fields, other), &key));
            if clash {
                return Err(StoreError::DuplicateKey {
                    collection: name.to_string(),
                    fields: fields.clone(),
                });
            }
        }
        Ok(())
    }
}

fn index_key(fields: &[String], doc: &Document) -> Vec<Value> {
    fields
        .iter()
        .map(|field| get_path(doc, field).cloned().unwrap_or(Value::Null))
        .collect()
}

fn keys_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
}

/// Document store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();

        coll.docs.push(doc);
        let idx = coll.docs.len() - 1;
        if let Err(e) = coll.check_unique(collection, idx) {
            coll.docs.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map_or(0, |c| c.docs.iter().filter(|d| filter.matches(d)).count() as u64))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &[Update],
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(idx) = coll.docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let mut updated = coll.docs[idx].clone();
        for update in updates {
            update.apply(&mut updated)?;
        }

        let original = std::mem::replace(&mut coll.docs[idx], updated);
        if let Err(e) = coll.check_unique(collection, idx) {
            coll.docs[idx] = original;
            return Err(e);
        }
        Ok(Some(coll.docs[idx].clone()))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &[Update],
    ) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let targets: Vec<usize> = coll
            .docs
            .iter()
            .enumerate()
            .filter(|(_, d)| filter.matches(d))
            .map(|(i, _)| i)
            .collect();

        let mut staged = Vec::with_capacity(targets.len());
        for &idx in &targets {
            let mut updated = coll.docs[idx].clone();
            for update in updates {
                update.apply(&mut updated)?;
            }
            staged.push((idx, updated));
        }

        let mut originals = Vec::with_capacity(staged.len());
        for (idx, updated) in staged {
            originals.push((idx, std::mem::replace(&mut coll.docs[idx], updated)));
        }

        for &idx in &targets {
            if let Err(e) = coll.check_unique(collection, idx) {
                for (idx, original) in originals {
                    coll.docs[idx] = original;
                }
                return Err(e);
            }
        }
        Ok(targets.len() as u64)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let position = coll.docs.iter().position(|d| filter.matches(d));
        Ok(position.map(|idx| coll.docs.remove(idx)))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = coll.docs.len();
        coll.docs.retain(|d| !filter.matches(d));
        Ok((before - coll.docs.len()) as u64)
    }

    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|c| c.docs.clone())
            .unwrap_or_default();
        run_pipeline(&collections, docs, pipeline)
    }

    async fn create_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        let fields: Vec<String> = fields.iter().map(ToString::to_string).collect();

        if coll.unique.contains(&fields) {
            return Ok(());
        }

        for (i, doc) in coll.docs.iter().enumerate() {
            let key = index_key(&fields, doc);
            if coll.docs[i + 1..]
                .iter()
                .any(|other| keys_equal(&index_key(&fields, other), &key))
            {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    fields,
                });
            }
        }

        coll.unique.push(fields);
        Ok(())
    }
}

fn run_pipeline(
    collections: &Collections,
    mut docs: Vec<Document>,
    pipeline: &[Stage],
) -> StoreResult<Vec<Document>> {
    for stage in pipeline {
        docs = match stage {
            Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
            Stage::Lookup(lookup) => docs
                .into_iter()
                .map(|d| join(collections, d, lookup))
                .collect::<StoreResult<_>>()?,
            Stage::Set(fields) => docs
                .into_iter()
                .map(|mut d| {
                    let computed: Vec<(String, Value)> = fields
                        .iter()
                        .map(|(name, expr)| (name.clone(), eval(&d, expr)))
                        .collect();
                    d.extend(computed);
                    d
                })
                .collect(),
            Stage::Project(fields) => docs
                .into_iter()
                .map(|d| {
                    d.into_iter()
                        .filter(|(k, _)| k.as_str() == ID || fields.contains(k))
                        .collect()
                })
                .collect(),
            Stage::Unset(fields) => docs
                .into_iter()
                .map(|mut d| {
                    for field in fields {
                        d.remove(field);
                    }
                    d
                })
                .collect(),
            Stage::Sort(keys) => {
                docs.sort_by(|a, b| compare_docs(a, b, keys));
                docs
            }
            Stage::Skip(n) => docs
                .into_iter()
                .skip(usize::try_from(*n).unwrap_or(usize::MAX))
                .collect(),
            Stage::Limit(n) => {
                docs.truncate(usize::try_from(*n).unwrap_or(usize::MAX));
                docs
            }
        };
    }
    Ok(docs)
}

fn join(collections: &Collections, mut doc: Document, lookup: &Lookup) -> StoreResult<Document> {
    let foreign: &[Document] = collections
        .get(&lookup.from)
        .map_or(&[], |c| c.docs.as_slice());

    let keys: Vec<Value> = match get_path(&doc, &lookup.local_field) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(value) => vec![value.clone()],
    };

    let mut joined = Vec::new();
    for key in &keys {
        joined.extend(
            foreign
                .iter()
                .filter(|f| {
                    collect_path(f, &lookup.foreign_field)
                        .into_iter()
                        .any(|v| values_equal(v, key))
                })
                .cloned(),
        );
    }

    let joined = run_pipeline(collections, joined, &lookup.pipeline)?;
    doc.insert(
        lookup.as_field.clone(),
        Value::Array(joined.into_iter().map(Value::Object).collect()),
    );
    Ok(doc)
}

fn eval(doc: &Document, expr: &Expr) -> Value {
    match expr {
        Expr::Field(path) => get_path(doc, path).cloned().unwrap_or(Value::Null),
        Expr::Literal(value) => value.clone(),
        Expr::Size(path) => Value::from(
            get_path(doc, path)
                .and_then(Value::as_array)
                .map_or(0, Vec::len) as u64,
        ),
        Expr::First(path) => match get_path(doc, path) {
            Some(Value::Array(items)) => items.first().cloned().unwrap_or(Value::Null),
            Some(value) => value.clone(),
            None => Value::Null,
        },
        Expr::Contains { path, value } => Value::Bool(
            !value.is_null()
                && collect_path(doc, path)
                    .into_iter()
                    .any(|candidate| values_equal(candidate, value)),
        ),
        Expr::Sum(path) => sum(&collect_path(doc, path)),
    }
}

fn sum(values: &[&Value]) -> Value {
    let mut int_total: i64 = 0;
    let mut float_total = 0.0;
    let mut saw_float = false;

    for value in values {
        if let Value::Number(n) = value {
            if let Some(i) = n.as_i64() {
                int_total = int_total.saturating_add(i);
            } else if let Some(f) = n.as_f64() {
                float_total += f;
                saw_float = true;
            }
        }
    }

    if saw_float {
        Number::from_f64(int_total as f64 + float_total).map_or(Value::Null, Value::Number)
    } else {
        Value::from(int_total)
    }
}

fn compare_docs(a: &Document, b: &Document, keys: &[SortKey]) -> std::cmp::Ordering {
    for key in keys {
        let left = get_path(a, &key.field).unwrap_or(&Value::Null);
        let right = get_path(b, &key.field).unwrap_or(&Value::Null);
        let ordering = match key.direction {
            SortDirection::Asc => compare_values(left, right),
            SortDirection::Desc => compare_values(right, left),
        };
        if ordering.is_ne() {
            return ordering;
        }
    }
    std::cmp::Ordering::Equal
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for user in [
            json!({"id": "u1", "username": "alice", "password": "secret"}),
            json!({"id": "u2", "username": "bob", "password": "hunter2"}),
        ] {
            store.insert_one("users", doc(user)).await.unwrap();
        }
        for video in [
            json!({"id": "v1", "owner": "u1", "title": "b", "views": 5}),
            json!({"id": "v2", "owner": "u2", "title": "a", "views": 5}),
            json!({"id": "v3", "owner": "gone", "title": "c", "views": 1}),
        ] {
            store.insert_one("videos", doc(video)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = seeded().await;
        let err = store
            .insert_one("users", doc(json!({"id": "u1", "username": "carol"})))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(store.count("users", &Filter::All).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unique_index_on_insert_and_update() {
        let store = seeded().await;
        store
            .create_unique_index("users", &["username"])
            .await
            .unwrap();

        let err = store
            .insert_one("users", doc(json!({"id": "u3", "username": "alice"})))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());

        let err = store
            .update_one("users", &Filter::id("u2"), &[Update::set("username", "alice")])
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());

        let bob = store.find_one("users", &Filter::id("u2")).await.unwrap().unwrap();
        assert_eq!(bob["username"], json!("bob"));
    }

    #[tokio::test]
    async fn test_unique_index_treats_missing_as_null() {
        let store = MemoryStore::new();
        store
            .create_unique_index("likes", &["likedBy", "video", "tweet"])
            .await
            .unwrap();
        store
            .insert_one("likes", doc(json!({"id": "l1", "likedBy": "u1", "video": "v1"})))
            .await
            .unwrap();
        store
            .insert_one("likes", doc(json!({"id": "l2", "likedBy": "u1", "tweet": "v1"})))
            .await
            .unwrap();
        let err = store
            .insert_one(
                "likes",
                doc(json!({"id": "l3", "likedBy": "u1", "video": "v1", "tweet": null})),
            )
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_create_index_over_existing_duplicates_fails() {
        let store = MemoryStore::new();
        for id in ["s1", "s2"] {
            store
                .insert_one("subs", doc(json!({"id": id, "subscriber": "a", "channel": "b"})))
                .await
                .unwrap();
        }
        let err = store
            .create_unique_index("subs", &["subscriber", "channel"])
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_lookup_collapse_and_projection() {
        let store = seeded().await;
        let pipeline = vec![
            Stage::Lookup(Lookup {
                from: "users".into(),
                local_field: "owner".into(),
                foreign_field: "id".into(),
                as_field: "ownerDetails".into(),
                pipeline: vec![Stage::Project(vec!["username".into()])],
            }),
            Stage::Set(vec![("ownerDetails".into(), Expr::First("ownerDetails".into()))]),
            Stage::Sort(vec![SortKey::asc("id")]),
        ];

        let rows = store.aggregate("videos", &pipeline).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["ownerDetails"], json!({"id": "u1", "username": "alice"}));
        assert_eq!(rows[1]["ownerDetails"], json!({"id": "u2", "username": "bob"}));
        assert_eq!(rows[2]["ownerDetails"], Value::Null);
    }

    #[tokio::test]
    async fn test_lookup_over_array_keeps_order() {
        let store = seeded().await;
        store
            .insert_one("playlists", doc(json!({"id": "p1", "videos": ["v3", "v1"]})))
            .await
            .unwrap();

        let pipeline = vec![
            Stage::Lookup(Lookup {
                from: "videos".into(),
                local_field: "videos".into(),
                foreign_field: "id".into(),
                as_field: "videos".into(),
                pipeline: vec![],
            }),
            Stage::Set(vec![
                ("totalVideos".into(), Expr::Size("videos".into())),
                ("totalViews".into(), Expr::Sum("videos.views".into())),
                (
                    "hasV1".into(),
                    Expr::Contains {
                        path: "videos.id".into(),
                        value: json!("v1"),
                    },
                ),
            ]),
        ];

        let rows = store.aggregate("playlists", &pipeline).await.unwrap();
        let ids: Vec<&Value> = collect_path(&rows[0], "videos.id");
        assert_eq!(ids, vec![&json!("v3"), &json!("v1")]);
        assert_eq!(rows[0]["totalVideos"], json!(2));
        assert_eq!(rows[0]["totalViews"], json!(6));
        assert_eq!(rows[0]["hasV1"], json!(true));
    }

    #[tokio::test]
    async fn test_sort_is_stable_and_windows() {
        let store = seeded().await;
        let pipeline = vec![
            Stage::Sort(vec![SortKey::desc("views")]),
            Stage::Skip(1),
            Stage::Limit(1),
        ];
        let rows = store.aggregate("videos", &pipeline).await.unwrap();
        assert_eq!(rows.len(), 1);
        // v1 and v2 tie on views; insertion order breaks the tie
        assert_eq!(rows[0]["id"], json!("v2"));
    }

    #[tokio::test]
    async fn test_update_many_and_delete_many() {
        let store = seeded().await;
        let touched = store
            .update_many("videos", &Filter::eq("views", 5), &[Update::inc("views", 1)])
            .await
            .unwrap();
        assert_eq!(touched, 2);
        assert_eq!(store.count("videos", &Filter::eq("views", 6)).await.unwrap(), 2);

        let removed = store
            .delete_many("videos", &Filter::eq("views", 6))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("videos", &Filter::All).await.unwrap(), 1);
        assert!(
            store
                .delete_one("videos", &Filter::id("v1"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
