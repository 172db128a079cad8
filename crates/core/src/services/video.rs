//! Video service.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator, validate_id};
use vidtube_db::entities::{User, Video, user, video};
use vidtube_db::{DocumentStore, Filter, Repository, Update};

use crate::cascade::{CascadeCoordinator, ParentKind};
use crate::ownership::{delete_owned, update_owned};
use crate::pagination::{Page, PageRequest};
use crate::view::catalog::published_or_owned;
use crate::view::{VideoCard, VideoDetail, ViewService};

/// Input for publishing a video. Media URLs come from the upload layer.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishVideoInput {
    /// Video title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Video description.
    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    /// Uploaded media URL.
    #[validate(length(min = 1))]
    pub video_file: String,

    /// Thumbnail URL.
    #[validate(length(min = 1))]
    pub thumbnail: String,

    /// Length in seconds.
    #[validate(range(min = 0.0))]
    pub duration: f64,
}

/// Input for updating a video.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoInput {
    /// New title.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    /// New description.
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,

    /// New thumbnail URL.
    pub thumbnail: Option<String>,
}

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    videos: Repository<Video>,
    users: Repository<User>,
    views: ViewService,
    cascade: CascadeCoordinator,
    id_gen: IdGenerator,
}

impl VideoService {
    /// Create a new video service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, views: ViewService) -> Self {
        Self {
            videos: Repository::new(store.clone()),
            users: Repository::new(store.clone()),
            views,
            cascade: CascadeCoordinator::new(store),
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a new video owned by `owner`.
    pub async fn publish_video(&self, owner: &str, input: PublishVideoInput) -> AppResult<Video> {
        validate_id(owner, "user id")?;
        input.validate()?;

        let now = Utc::now();
        let video = Video {
            id: self.id_gen.generate(),
            owner: owner.to_string(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            video_file: input.video_file,
            thumbnail: input.thumbnail,
            duration: input.duration,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };
        self.videos.insert(&video).await?;

        tracing::debug!(video_id = %video.id, owner = %owner, "Published video");
        Ok(video)
    }

    /// List videos, optionally of one owner.
    ///
    /// Unpublished videos are listed only to their owner.
    pub async fn list_videos(
        &self,
        owner: Option<&str>,
        request: &PageRequest,
        viewer: Option<&str>,
    ) -> AppResult<Page<VideoCard>> {
        let filter = match owner {
            Some(owner) => {
                validate_id(owner, "user id")?;
                Filter::eq(video::field::OWNER, owner)
            }
            None => Filter::All,
        };

        self.views.build_paged_view(filter, request, viewer).await
    }

    /// Watch a video.
    ///
    /// Counts the view and records it in the viewer's history before the
    /// detail view is built. Unpublished videos are not found for anyone but
    /// their owner.
    pub async fn get_video(&self, id: &str, viewer: Option<&str>) -> AppResult<VideoDetail> {
        validate_id(id, "video id")?;
        if let Some(viewer) = viewer {
            validate_id(viewer, "user id")?;
        }

        let visible = Filter::id(id).with(published_or_owned(viewer));
        if self
            .videos
            .update_one(&visible, &[Update::inc(video::field::VIEWS, 1)])
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        if let Some(viewer) = viewer {
            self.users
                .update_one(
                    &Filter::id(viewer),
                    &[Update::add_to_set(user::field::WATCH_HISTORY, id)],
                )
                .await?;
        }

        self.views.build_one(Filter::id(id), viewer).await
    }

    /// Update title, description or thumbnail.
    pub async fn update_video(&self, id: &str, owner: &str, input: UpdateVideoInput) -> AppResult<Video> {
        validate_id(id, "video id")?;
        input.validate()?;

        let mut updates = Vec::new();
        if let Some(title) = input.title {
            updates.push(Update::set(video::field::TITLE, title.trim()));
        }
        if let Some(description) = input.description {
            updates.push(Update::set(video::field::DESCRIPTION, description.trim()));
        }
        if let Some(thumbnail) = input.thumbnail {
            updates.push(Update::set(video::field::THUMBNAIL, thumbnail));
        }
        if updates.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        updates.push(touch());

        update_owned(&self.videos, id, owner, &updates).await
    }

    /// Flip the published flag.
    ///
    /// Applied as one store update.
    pub async fn toggle_publish_status(&self, id: &str, owner: &str) -> AppResult<Video> {
        validate_id(id, "video id")?;

        update_owned(
            &self.videos,
            id,
            owner,
            &[Update::flip(video::field::IS_PUBLISHED), touch()],
        )
        .await
    }

    /// Delete a video, then everything that referenced it.
    pub async fn delete_video(&self, id: &str, owner: &str) -> AppResult<()> {
        validate_id(id, "video id")?;

        delete_owned(&self.videos, id, owner).await?;
        self.cascade.cascade_delete(ParentKind::Video, id).await;

        tracing::debug!(video_id = %id, "Deleted video");
        Ok(())
    }
}

fn touch() -> Update {
    Update::set(video::field::UPDATED_AT, Utc::now().timestamp_millis())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pagination::PageComposer;
    use vidtube_common::PaginationConfig;
    use vidtube_db::test_utils::{fixtures, indexed_store};

    struct Fixture {
        service: VideoService,
        users: Repository<User>,
        alice: String,
        bob: String,
    }

    async fn fixture() -> Fixture {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        let users = Repository::<User>::new(store.clone());
        let id_gen = IdGenerator::new();
        let alice = id_gen.generate();
        let bob = id_gen.generate();
        users.insert(&fixtures::user(&alice, "alice")).await.unwrap();
        users.insert(&fixtures::user(&bob, "bob")).await.unwrap();

        Fixture {
            service: VideoService::new(store, views),
            users,
            alice,
            bob,
        }
    }

    fn input(title: &str) -> PublishVideoInput {
        PublishVideoInput {
            title: title.to_string(),
            description: "A video".to_string(),
            video_file: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail: "https://cdn.example.com/v.jpg".to_string(),
            duration: 12.5,
        }
    }

    #[tokio::test]
    async fn test_get_video_counts_view_and_history() {
        let f = fixture().await;
        let video = f.service.publish_video(&f.alice, input("Cats")).await.unwrap();

        f.service.get_video(&video.id, Some(&f.bob)).await.unwrap();
        let detail = f.service.get_video(&video.id, Some(&f.bob)).await.unwrap();

        assert_eq!(detail.video.views, 2);
        assert_eq!(detail.likes_count, 0);
        assert!(!detail.is_liked);
        let owner = detail.owner_details.unwrap();
        assert_eq!(owner.username, "alice");
        assert!(!owner.is_subscribed);

        let bob = f.users.get_by_id(&f.bob).await.unwrap();
        assert_eq!(bob.watch_history, vec![video.id]);
    }

    #[tokio::test]
    async fn test_unpublished_video_hidden_from_others() {
        let f = fixture().await;
        let video = f.service.publish_video(&f.alice, input("Draft")).await.unwrap();
        let video = f.service.toggle_publish_status(&video.id, &f.alice).await.unwrap();
        assert!(!video.is_published);

        let err = f.service.get_video(&video.id, Some(&f.bob)).await.unwrap_err();
        assert!(err.is_not_found());
        let err = f.service.get_video(&video.id, None).await.unwrap_err();
        assert!(err.is_not_found());

        let detail = f.service.get_video(&video.id, Some(&f.alice)).await.unwrap();
        assert_eq!(detail.video.views, 1);
    }

    #[tokio::test]
    async fn test_only_owner_mutates() {
        let f = fixture().await;
        let video = f.service.publish_video(&f.alice, input("Mine")).await.unwrap();

        let update = UpdateVideoInput {
            title: Some("Stolen".to_string()),
            ..UpdateVideoInput::default()
        };
        let err = f.service.update_video(&video.id, &f.bob, update).await.unwrap_err();
        assert!(matches!(err, AppError::NotOwner(_)));

        let err = f.service.delete_video(&video.id, &f.bob).await.unwrap_err();
        assert!(err.is_not_found());

        let update = UpdateVideoInput {
            title: Some(" Renamed ".to_string()),
            ..UpdateVideoInput::default()
        };
        let video = f.service.update_video(&video.id, &f.alice, update).await.unwrap();
        assert_eq!(video.title, "Renamed");

        f.service.delete_video(&video.id, &f.alice).await.unwrap();
        let err = f.service.get_video(&video.id, Some(&f.alice)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publish_toggles_all_apply() {
        let f = fixture().await;
        let video = f.service.publish_video(&f.alice, input("Flip")).await.unwrap();

        let toggles = (0..9).map(|_| {
            let service = f.service.clone();
            let (id, owner) = (video.id.clone(), f.alice.clone());
            tokio::spawn(async move { service.toggle_publish_status(&id, &owner).await })
        });
        for result in futures::future::join_all(toggles).await {
            result.unwrap().unwrap();
        }

        let video = f.service.videos.get_by_id(&video.id).await.unwrap();
        assert!(!video.is_published, "an odd number of flips must unpublish");
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let f = fixture().await;
        let video = f.service.publish_video(&f.alice, input("Mine")).await.unwrap();

        let err = f
            .service
            .update_video(&video.id, &f.alice, UpdateVideoInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_search_and_sort() {
        let f = fixture().await;
        for title in ["Cooking pasta", "Cats and dogs", "More cats"] {
            f.service.publish_video(&f.alice, input(title)).await.unwrap();
        }

        let request = PageRequest::default()
            .searching("CATS")
            .sorted_by("title", vidtube_db::SortDirection::Asc);
        let page = f.service.list_videos(None, &request, None).await.unwrap();

        let titles: Vec<_> = page.docs.iter().map(|v| v.video.title.as_str()).collect();
        assert_eq!(titles, vec!["Cats and dogs", "More cats"]);
        assert_eq!(page.total_docs, 2);
        assert!(page.docs.iter().all(|v| v.owner_details.is_some()));
    }
}
