//! Playlist service.
//!
//! Membership is a set: adding a present video and removing an absent one
//! are both no-ops, applied atomically by the store.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator, validate_id};
use vidtube_db::entities::{Playlist, Video, playlist};
use vidtube_db::{DocumentStore, Filter, Repository, Update};

use crate::cascade::{CascadeCoordinator, ParentKind};
use crate::ownership::{delete_owned, update_owned};
use crate::view::catalog::published_or_owned;
use crate::view::{PlaylistSummary, PlaylistView, ViewService};

/// Input for creating a playlist.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistInput {
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Free text, may be empty.
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,
}

/// Input for updating a playlist.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePlaylistInput {
    /// New display name.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    /// New description.
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Playlist service for business logic.
#[derive(Clone)]
pub struct PlaylistService {
    playlists: Repository<Playlist>,
    videos: Repository<Video>,
    views: ViewService,
    cascade: CascadeCoordinator,
    id_gen: IdGenerator,
}

impl PlaylistService {
    /// Create a new playlist service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, views: ViewService) -> Self {
        Self {
            playlists: Repository::new(store.clone()),
            videos: Repository::new(store.clone()),
            views,
            cascade: CascadeCoordinator::new(store),
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an empty playlist owned by `owner`.
    pub async fn create_playlist(&self, owner: &str, input: CreatePlaylistInput) -> AppResult<Playlist> {
        validate_id(owner, "user id")?;
        input.validate()?;

        let now = Utc::now();
        let playlist = Playlist {
            id: self.id_gen.generate(),
            owner: owner.to_string(),
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            videos: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.playlists.insert(&playlist).await?;
        Ok(playlist)
    }

    /// Playlists of `owner`, newest first, with video and view totals.
    pub async fn user_playlists(&self, owner: &str) -> AppResult<Vec<PlaylistSummary>> {
        validate_id(owner, "user id")?;
        self.views
            .build_view(Filter::eq(playlist::field::OWNER, owner), None)
            .await
    }

    /// A playlist with its videos as `viewer` may see them.
    pub async fn get_playlist(&self, id: &str, viewer: Option<&str>) -> AppResult<PlaylistView> {
        validate_id(id, "playlist id")?;
        self.views.build_one(Filter::id(id), viewer).await
    }

    /// Add a video `owner` can see. Adding a present video is a no-op.
    pub async fn add_video_to_playlist(&self, id: &str, video_id: &str, owner: &str) -> AppResult<Playlist> {
        validate_id(id, "playlist id")?;
        validate_id(video_id, "video id")?;
        let visible = Filter::id(video_id).with(published_or_owned(Some(owner)));
        if !self.videos.exists(&visible).await? {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        update_owned(
            &self.playlists,
            id,
            owner,
            &[Update::add_to_set(playlist::field::VIDEOS, video_id), touch()],
        )
        .await
    }

    /// Remove a video. Removing an absent video is a no-op.
    pub async fn remove_video_from_playlist(
        &self,
        id: &str,
        video_id: &str,
        owner: &str,
    ) -> AppResult<Playlist> {
        validate_id(id, "playlist id")?;
        validate_id(video_id, "video id")?;

        update_owned(
            &self.playlists,
            id,
            owner,
            &[Update::pull(playlist::field::VIDEOS, video_id), touch()],
        )
        .await
    }

    /// Rename or redescribe a playlist.
    pub async fn update_playlist(&self, id: &str, owner: &str, input: UpdatePlaylistInput) -> AppResult<Playlist> {
        validate_id(id, "playlist id")?;
        input.validate()?;

        let mut updates = Vec::new();
        if let Some(name) = input.name {
            updates.push(Update::set(playlist::field::NAME, name.trim()));
        }
        if let Some(description) = input.description {
            updates.push(Update::set(playlist::field::DESCRIPTION, description.trim()));
        }
        if updates.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        updates.push(touch());

        update_owned(&self.playlists, id, owner, &updates).await
    }

    /// Delete a playlist and the comments on it.
    pub async fn delete_playlist(&self, id: &str, owner: &str) -> AppResult<()> {
        validate_id(id, "playlist id")?;

        delete_owned(&self.playlists, id, owner).await?;
        self.cascade.cascade_delete(ParentKind::Playlist, id).await;
        Ok(())
    }
}

fn touch() -> Update {
    Update::set(playlist::field::UPDATED_AT, Utc::now().timestamp_millis())
}
