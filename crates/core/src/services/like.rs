//! Like service.

use std::sync::Arc;

use serde_json::Value;
use vidtube_common::{AppError, AppResult, validate_id};
use vidtube_db::entities::{Comment, Entity, Like, LikeTarget, Tweet, Video, like};
use vidtube_db::{DocumentStore, Filter, Repository};

use crate::toggle::{EdgeTarget, ToggleManager, ToggleState};
use crate::view::{LikeView, LikedVideo, ViewService};

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    videos: Repository<Video>,
    comments: Repository<Comment>,
    tweets: Repository<Tweet>,
    toggles: ToggleManager,
    views: ViewService,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, views: ViewService) -> Self {
        Self {
            videos: Repository::new(store.clone()),
            comments: Repository::new(store.clone()),
            tweets: Repository::new(store.clone()),
            toggles: ToggleManager::new(store),
            views,
        }
    }

    /// Like or unlike a video.
    pub async fn toggle_video_like(&self, actor: &str, video_id: &str) -> AppResult<ToggleState> {
        self.toggle(actor, LikeTarget::Video(video_id.to_string())).await
    }

    /// Like or unlike a comment.
    pub async fn toggle_comment_like(&self, actor: &str, comment_id: &str) -> AppResult<ToggleState> {
        self.toggle(actor, LikeTarget::Comment(comment_id.to_string())).await
    }

    /// Like or unlike a tweet.
    pub async fn toggle_tweet_like(&self, actor: &str, tweet_id: &str) -> AppResult<ToggleState> {
        self.toggle(actor, LikeTarget::Tweet(tweet_id.to_string())).await
    }

    /// Videos `user_id` liked, newest like first.
    pub async fn liked_videos(&self, user_id: &str) -> AppResult<Vec<LikedVideo>> {
        validate_id(user_id, "user id")?;

        let filter = Filter::and([
            Filter::eq(like::field::LIKED_BY, user_id),
            Filter::ne(like::field::VIDEO, Value::Null),
        ]);
        self.views.build_view(filter, None).await
    }

    /// Every like of `target`, with its author.
    pub async fn likes_of(&self, target: &LikeTarget) -> AppResult<Vec<LikeView>> {
        validate_id(target.id(), &format!("{} id", target.kind()))?;
        self.views.build_view(target.filter(), None).await
    }

    async fn toggle(&self, actor: &str, target: LikeTarget) -> AppResult<ToggleState> {
        let target = EdgeTarget::Like(target);
        ToggleManager::validate(actor, &target)?;

        if let EdgeTarget::Like(liked) = &target {
            let filter = Filter::id(liked.id());
            let (exists, label) = match liked {
                LikeTarget::Video(_) => (self.videos.exists(&filter).await?, Video::LABEL),
                LikeTarget::Comment(_) => (self.comments.exists(&filter).await?, Comment::LABEL),
                LikeTarget::Tweet(_) => (self.tweets.exists(&filter).await?, Tweet::LABEL),
            };
            if !exists {
                return Err(AppError::NotFound(format!("{label} not found")));
            }
        }

        Ok(self.toggles.toggle(actor, &target).await?.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pagination::PageComposer;
    use vidtube_common::{IdGenerator, PaginationConfig};
    use vidtube_db::entities::User;
    use vidtube_db::test_utils::{fixtures, indexed_store};

    #[tokio::test]
    async fn test_liked_videos_skips_dangling() {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        let service = LikeService::new(store.clone(), views);
        let id_gen = IdGenerator::new();
        let (alice, kept, dropped, tweet) = (
            id_gen.generate(),
            id_gen.generate(),
            id_gen.generate(),
            id_gen.generate(),
        );

        Repository::<User>::new(store.clone())
            .insert(&fixtures::user(&alice, "alice"))
            .await
            .unwrap();
        let videos = Repository::<Video>::new(store.clone());
        videos.insert(&fixtures::video(&kept, &alice, "Kept", true, 5)).await.unwrap();
        videos.insert(&fixtures::video(&dropped, &alice, "Dropped", true, 5)).await.unwrap();
        Repository::<Tweet>::new(store.clone())
            .insert(&fixtures::tweet(&tweet, &alice, "hello"))
            .await
            .unwrap();

        assert!(service.toggle_video_like(&alice, &kept).await.unwrap().present);
        assert!(service.toggle_video_like(&alice, &dropped).await.unwrap().present);
        assert!(service.toggle_tweet_like(&alice, &tweet).await.unwrap().present);

        // Removed without a cascade, leaving its like behind.
        videos.delete_one(&Filter::id(dropped.as_str())).await.unwrap();

        let liked = service.liked_videos(&alice).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].liked_video.video.id, kept);
        assert_eq!(liked[0].liked_video.owner_details.as_ref().unwrap().id, alice);
    }

    #[tokio::test]
    async fn test_like_missing_target_not_found() {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        let service = LikeService::new(store, views);
        let id_gen = IdGenerator::new();

        let err = service
            .toggle_comment_like(&id_gen.generate(), &id_gen.generate())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service.toggle_tweet_like(&id_gen.generate(), "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
