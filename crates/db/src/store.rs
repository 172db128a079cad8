//! Entity store abstraction.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::StoreResult;
use crate::filter::Filter;
use crate::pipeline::Stage;
use crate::update::Update;

/// A collection-oriented document store without native joins.
///
/// Every method is one round trip and is atomic with respect to the
/// documents it touches. Unique indexes are enforced on every write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document. Fails with `DuplicateKey` on an id or unique-index clash.
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<()>;

    /// First document matching `filter`, in insertion order.
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Every document matching `filter`, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// Number of documents matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Apply `updates` to the first matching document and return it as updated.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &[Update],
    ) -> StoreResult<Option<Document>>;

    /// Apply `updates` to every matching document; returns how many matched.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &[Update],
    ) -> StoreResult<u64>;

    /// Remove the first matching document and return it.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Remove every matching document; returns how many were removed.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Run a pipeline over `collection`.
    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> StoreResult<Vec<Document>>;

    /// Declare that the combination of `fields` is unique within `collection`.
    ///
    /// Missing fields take part as `null`. Idempotent.
    async fn create_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()>;
}
