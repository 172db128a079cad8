//! Tweet service.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator, validate_id};
use vidtube_db::entities::{Tweet, User, tweet};
use vidtube_db::{DocumentStore, Filter, Repository, Update};

use crate::cascade::{CascadeCoordinator, ParentKind};
use crate::ownership::{delete_owned, update_owned};
use crate::pagination::{Page, PageRequest};
use crate::view::{TweetView, ViewService};

/// Tweet body.
#[derive(Debug, Deserialize, Validate)]
pub struct TweetInput {
    /// Tweet text; surrounding whitespace is trimmed.
    #[validate(length(min = 1, max = 280))]
    pub content: String,
}

/// Tweet service for business logic.
#[derive(Clone)]
pub struct TweetService {
    tweets: Repository<Tweet>,
    users: Repository<User>,
    views: ViewService,
    cascade: CascadeCoordinator,
    id_gen: IdGenerator,
}

impl TweetService {
    /// Create a new tweet service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, views: ViewService) -> Self {
        Self {
            tweets: Repository::new(store.clone()),
            users: Repository::new(store.clone()),
            views,
            cascade: CascadeCoordinator::new(store),
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a tweet.
    pub async fn create_tweet(&self, owner: &str, input: TweetInput) -> AppResult<Tweet> {
        validate_id(owner, "user id")?;
        input.validate()?;

        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Tweet content is required".to_string()));
        }

        let now = Utc::now();
        let tweet = Tweet {
            id: self.id_gen.generate(),
            owner: owner.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tweets.insert(&tweet).await?;

        tracing::debug!(tweet_id = %tweet.id, owner = %owner, "Created tweet");
        Ok(tweet)
    }

    /// Tweets by `user_id`, newest first unless the request says otherwise.
    pub async fn list_user_tweets(
        &self,
        user_id: &str,
        request: &PageRequest,
        viewer: Option<&str>,
    ) -> AppResult<Page<TweetView>> {
        validate_id(user_id, "user id")?;
        if !self.users.exists(&Filter::id(user_id)).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.views
            .build_paged_view(Filter::eq(tweet::field::OWNER, user_id), request, viewer)
            .await
    }

    /// Edit a tweet.
    pub async fn update_tweet(&self, id: &str, owner: &str, input: TweetInput) -> AppResult<Tweet> {
        validate_id(id, "tweet id")?;
        input.validate()?;

        update_owned(
            &self.tweets,
            id,
            owner,
            &[
                Update::set(tweet::field::CONTENT, input.content.trim()),
                Update::set(tweet::field::UPDATED_AT, Utc::now().timestamp_millis()),
            ],
        )
        .await
    }

    /// Delete a tweet and its likes.
    pub async fn delete_tweet(&self, id: &str, owner: &str) -> AppResult<()> {
        validate_id(id, "tweet id")?;

        delete_owned(&self.tweets, id, owner).await?;
        self.cascade.cascade_delete(ParentKind::Tweet, id).await;
        Ok(())
    }
}
