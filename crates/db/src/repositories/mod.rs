//! Typed repository over one entity collection.

use std::marker::PhantomData;
use std::sync::Arc;

use vidtube_common::{AppError, AppResult};

use crate::document::Document;
use crate::entities::Entity;
use crate::error::StoreResult;
use crate::filter::Filter;
use crate::pipeline::Stage;
use crate::store::DocumentStore;
use crate::update::Update;

/// Repository for database operations on entity `E`.
pub struct Repository<E> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    /// Create a new repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Insert an entity, surfacing unique-index clashes as `Conflict`.
    pub async fn insert(&self, entity: &E) -> AppResult<()> {
        Ok(self.try_insert(entity).await?)
    }

    /// Insert an entity, keeping the raw store error so callers can react
    /// to `DuplicateKey`.
    pub async fn try_insert(&self, entity: &E) -> StoreResult<()> {
        self.store
            .insert_one(E::COLLECTION, entity.to_document()?)
            .await
    }

    /// Find an entity by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<E>> {
        self.find_one(&Filter::id(id)).await
    }

    /// Get an entity by ID, failing with `NotFound`.
    pub async fn get_by_id(&self, id: &str) -> AppResult<E> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", E::LABEL)))
    }

    /// Find the first entity matching `filter`.
    pub async fn find_one(&self, filter: &Filter) -> AppResult<Option<E>> {
        self.store
            .find_one(E::COLLECTION, filter)
            .await?
            .map(decode)
            .transpose()
    }

    /// Find every entity matching `filter`.
    pub async fn find(&self, filter: &Filter) -> AppResult<Vec<E>> {
        self.store
            .find(E::COLLECTION, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Count entities matching `filter`.
    pub async fn count(&self, filter: &Filter) -> AppResult<u64> {
        Ok(self.store.count(E::COLLECTION, filter).await?)
    }

    /// Whether any entity matches `filter`.
    pub async fn exists(&self, filter: &Filter) -> AppResult<bool> {
        Ok(self.store.find_one(E::COLLECTION, filter).await?.is_some())
    }

    /// Update the first entity matching `filter` and return it as updated.
    pub async fn update_one(&self, filter: &Filter, updates: &[Update]) -> AppResult<Option<E>> {
        self.store
            .update_one(E::COLLECTION, filter, updates)
            .await?
            .map(decode)
            .transpose()
    }

    /// Update every entity matching `filter`.
    pub async fn update_many(&self, filter: &Filter, updates: &[Update]) -> AppResult<u64> {
        Ok(self
            .store
            .update_many(E::COLLECTION, filter, updates)
            .await?)
    }

    /// Delete the first entity matching `filter` and return it.
    pub async fn delete_one(&self, filter: &Filter) -> AppResult<Option<E>> {
        self.store
            .delete_one(E::COLLECTION, filter)
            .await?
            .map(decode)
            .transpose()
    }

    /// Delete every entity matching `filter`.
    pub async fn delete_many(&self, filter: &Filter) -> AppResult<u64> {
        Ok(self.store.delete_many(E::COLLECTION, filter).await?)
    }

    /// Run a pipeline rooted at this collection.
    pub async fn aggregate(&self, pipeline: &[Stage]) -> AppResult<Vec<Document>> {
        Ok(self.store.aggregate(E::COLLECTION, pipeline).await?)
    }
}

fn decode<E: Entity>(doc: Document) -> AppResult<E> {
    Ok(E::from_document(doc)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::Tweet;
    use crate::memory::MemoryStore;
    use chrono::Utc;

    fn tweet(id: &str, owner: &str, content: &str) -> Tweet {
        let now = Utc::now();
        Tweet {
            id: id.to_string(),
            owner: owner.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn repo() -> Repository<Tweet> {
        Repository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let repo = repo();
        repo.insert(&tweet("t1", "u1", "hello")).await.unwrap();

        let found = repo.find_by_id("t1").await.unwrap().unwrap();
        assert_eq!(found.content, "hello");
        assert!(repo.find_by_id("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let err = repo().get_by_id("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Tweet not found"));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict() {
        let repo = repo();
        repo.insert(&tweet("t1", "u1", "a")).await.unwrap();
        let err = repo.insert(&tweet("t1", "u1", "b")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(repo.try_insert(&tweet("t1", "u1", "c")).await.unwrap_err().is_duplicate_key());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo();
        repo.insert(&tweet("t1", "u1", "a")).await.unwrap();

        let updated = repo
            .update_one(&Filter::id("t1"), &[Update::set("content", "b")])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "b");

        let deleted = repo.delete_one(&Filter::id("t1")).await.unwrap().unwrap();
        assert_eq!(deleted.id, "t1");
        assert_eq!(repo.count(&Filter::All).await.unwrap(), 0);
    }
}
