//! Comment service.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator, validate_id};
use vidtube_db::entities::{Comment, Playlist, Video, comment};
use vidtube_db::{DocumentStore, Filter, Repository, Update};

use crate::cascade::{CascadeCoordinator, ParentKind};
use crate::ownership::{delete_owned, update_owned};
use crate::pagination::{Page, PageRequest};
use crate::view::{CommentView, ViewService};

/// What a comment is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentTarget {
    /// A video, by id.
    Video(String),
    /// A playlist, by id.
    Playlist(String),
}

/// Comment body.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    /// Comment text; surrounding whitespace is trimmed.
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

impl CommentInput {
    fn content(&self) -> AppResult<String> {
        self.validate()?;
        let content = self.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment content is required".to_string()));
        }
        Ok(content.to_string())
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comments: Repository<Comment>,
    videos: Repository<Video>,
    playlists: Repository<Playlist>,
    views: ViewService,
    cascade: CascadeCoordinator,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, views: ViewService) -> Self {
        Self {
            comments: Repository::new(store.clone()),
            videos: Repository::new(store.clone()),
            playlists: Repository::new(store.clone()),
            views,
            cascade: CascadeCoordinator::new(store),
            id_gen: IdGenerator::new(),
        }
    }

    /// Comments on a video.
    pub async fn list_video_comments(
        &self,
        video_id: &str,
        request: &PageRequest,
        viewer: Option<&str>,
    ) -> AppResult<Page<CommentView>> {
        self.ensure_target(&CommentTarget::Video(video_id.to_string())).await?;
        self.views
            .build_paged_view(Filter::eq(comment::field::VIDEO, video_id), request, viewer)
            .await
    }

    /// Comments on a playlist.
    pub async fn list_playlist_comments(
        &self,
        playlist_id: &str,
        request: &PageRequest,
        viewer: Option<&str>,
    ) -> AppResult<Page<CommentView>> {
        self.ensure_target(&CommentTarget::Playlist(playlist_id.to_string())).await?;
        self.views
            .build_paged_view(Filter::eq(comment::field::PLAYLIST, playlist_id), request, viewer)
            .await
    }

    /// Add a comment by `owner`.
    pub async fn add_comment(
        &self,
        owner: &str,
        target: CommentTarget,
        input: CommentInput,
    ) -> AppResult<Comment> {
        validate_id(owner, "user id")?;
        let content = input.content()?;
        self.ensure_target(&target).await?;

        let (video, playlist) = match target {
            CommentTarget::Video(id) => (Some(id), None),
            CommentTarget::Playlist(id) => (None, Some(id)),
        };
        let now = Utc::now();
        let comment = Comment {
            id: self.id_gen.generate(),
            owner: owner.to_string(),
            video,
            playlist,
            content,
            created_at: now,
            updated_at: now,
        };
        self.comments.insert(&comment).await?;

        tracing::debug!(comment_id = %comment.id, owner = %owner, "Added comment");
        Ok(comment)
    }

    /// Edit a comment's content.
    pub async fn update_comment(&self, id: &str, owner: &str, input: CommentInput) -> AppResult<Comment> {
        validate_id(id, "comment id")?;
        let content = input.content()?;

        update_owned(
            &self.comments,
            id,
            owner,
            &[
                Update::set(comment::field::CONTENT, content),
                Update::set(comment::field::UPDATED_AT, Utc::now().timestamp_millis()),
            ],
        )
        .await
    }

    /// Delete a comment and its likes.
    pub async fn delete_comment(&self, id: &str, owner: &str) -> AppResult<()> {
        validate_id(id, "comment id")?;

        delete_owned(&self.comments, id, owner).await?;
        self.cascade.cascade_delete(ParentKind::Comment, id).await;
        Ok(())
    }

    async fn ensure_target(&self, target: &CommentTarget) -> AppResult<()> {
        let exists = match target {
            CommentTarget::Video(id) => {
                validate_id(id, "video id")?;
                self.videos.exists(&Filter::id(id.as_str())).await?
            }
            CommentTarget::Playlist(id) => {
                validate_id(id, "playlist id")?;
                self.playlists.exists(&Filter::id(id.as_str())).await?
            }
        };

        if exists {
            Ok(())
        } else {
            let label = match target {
                CommentTarget::Video(_) => "Video",
                CommentTarget::Playlist(_) => "Playlist",
            };
            Err(AppError::NotFound(format!("{label} not found")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pagination::PageComposer;
    use crate::toggle::{EdgeTarget, ToggleManager};
    use vidtube_common::PaginationConfig;
    use vidtube_db::entities::{Like, LikeTarget, User};
    use vidtube_db::test_utils::{fixtures, indexed_store};

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        let service = CommentService::new(store.clone(), views);
        let id_gen = IdGenerator::new();
        let (alice, video) = (id_gen.generate(), id_gen.generate());

        Repository::<User>::new(store.clone())
            .insert(&fixtures::user(&alice, "alice"))
            .await
            .unwrap();
        Repository::<Video>::new(store.clone())
            .insert(&fixtures::video(&video, &alice, "Cats", true, 0))
            .await
            .unwrap();

        let input = |content: &str| CommentInput {
            content: content.to_string(),
        };
        let comment = service
            .add_comment(&alice, CommentTarget::Video(video.clone()), input(" first! "))
            .await
            .unwrap();
        assert_eq!(comment.content, "first!");

        ToggleManager::new(store.clone())
            .toggle(&alice, &EdgeTarget::Like(LikeTarget::Comment(comment.id.clone())))
            .await
            .unwrap();

        let page = service
            .list_video_comments(&video, &PageRequest::default(), Some(&alice))
            .await
            .unwrap();
        assert_eq!(page.total_docs, 1);
        assert_eq!(page.docs[0].likes_count, 1);
        assert!(page.docs[0].is_liked);
        assert_eq!(page.docs[0].owner_details.as_ref().unwrap().username, "alice");

        service.delete_comment(&comment.id, &alice).await.unwrap();
        let likes = Repository::<Like>::new(store).count(&Filter::All).await.unwrap();
        assert_eq!(likes, 0);
    }

    #[tokio::test]
    async fn test_comment_needs_existing_target() {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        let service = CommentService::new(store, views);
        let id_gen = IdGenerator::new();

        let err = service
            .add_comment(
                &id_gen.generate(),
                CommentTarget::Playlist(id_gen.generate()),
                CommentInput {
                    content: "hi".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .add_comment(
                &id_gen.generate(),
                CommentTarget::Video(id_gen.generate()),
                CommentInput {
                    content: "   ".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
