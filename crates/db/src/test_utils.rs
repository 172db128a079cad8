//! Test utilities for store-backed code.
//!
//! Provides an indexed in-memory store, entity fixtures and a store wrapper
//! that injects failures.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::document::Document;
use crate::entities::{Comment, Playlist, Tweet, User, Video};
use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::indexes::ensure_indexes;
use crate::memory::MemoryStore;
use crate::pipeline::Stage;
use crate::store::DocumentStore;
use crate::update::Update;

/// A fresh in-memory store with all unique indexes in place.
pub async fn indexed_store() -> Arc<dyn DocumentStore> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    if let Err(e) = ensure_indexes(store.as_ref()).await {
        panic!("failed to create indexes on an empty store: {e}");
    }
    store
}

/// Entity fixtures with sensible defaults.
pub mod fixtures {
    use super::{Comment, Duration, Playlist, Tweet, User, Utc, Video};

    /// A user whose id is `id` and whose username is `username`.
    #[must_use]
    pub fn user(id: &str, username: &str) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: username.to_uppercase(),
            avatar: Some(format!("https://cdn.example.com/{username}.png")),
            cover_image: None,
            watch_history: Vec::new(),
            password: Some("$argon2id$placeholder".to_string()),
            refresh_token: Some("refresh-token".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// A video created `age_minutes` ago.
    #[must_use]
    pub fn video(id: &str, owner: &str, title: &str, published: bool, age_minutes: i64) -> Video {
        let at = Utc::now() - Duration::minutes(age_minutes);
        Video {
            id: id.to_string(),
            owner: owner.to_string(),
            title: title.to_string(),
            description: format!("About {title}"),
            video_file: format!("https://cdn.example.com/{id}.mp4"),
            thumbnail: format!("https://cdn.example.com/{id}.jpg"),
            duration: 60.0,
            views: 0,
            is_published: published,
            created_at: at,
            updated_at: at,
        }
    }

    /// A tweet.
    #[must_use]
    pub fn tweet(id: &str, owner: &str, content: &str) -> Tweet {
        let now = Utc::now();
        Tweet {
            id: id.to_string(),
            owner: owner.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A comment on a video.
    #[must_use]
    pub fn comment(id: &str, owner: &str, video: &str, content: &str) -> Comment {
        let now = Utc::now();
        Comment {
            id: id.to_string(),
            owner: owner.to_string(),
            video: Some(video.to_string()),
            playlist: None,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A playlist holding `videos`.
    #[must_use]
    pub fn playlist(id: &str, owner: &str, name: &str, videos: &[&str]) -> Playlist {
        let now = Utc::now();
        Playlist {
            id: id.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            description: String::new(),
            videos: videos.iter().map(ToString::to_string).collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Store wrapper whose bulk deletes fail for selected collections.
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    failing: HashSet<String>,
}

impl FlakyStore {
    /// Wrap `inner`, failing `delete_many` / `update_many` on `collections`.
    pub fn new(inner: Arc<dyn DocumentStore>, collections: &[&str]) -> Self {
        Self {
            inner,
            failing: collections.iter().map(ToString::to_string).collect(),
        }
    }

    fn check(&self, collection: &str) -> StoreResult<()> {
        if self.failing.contains(collection) {
            return Err(StoreError::Backend(format!("injected failure on {collection}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<()> {
        self.inner.insert_one(collection, doc).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        self.inner.find_one(collection, filter).await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.inner.find(collection, filter).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.inner.count(collection, filter).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &[Update],
    ) -> StoreResult<Option<Document>> {
        self.inner.update_one(collection, filter, updates).await
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &[Update],
    ) -> StoreResult<u64> {
        self.check(collection)?;
        self.inner.update_many(collection, filter, updates).await
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        self.inner.delete_one(collection, filter).await
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.check(collection)?;
        self.inner.delete_many(collection, filter).await
    }

    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> StoreResult<Vec<Document>> {
        self.inner.aggregate(collection, pipeline).await
    }

    async fn create_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        self.inner.create_unique_index(collection, fields).await
    }
}
