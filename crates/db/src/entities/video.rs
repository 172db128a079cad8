//! Video entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Owned};

/// Stored field names.
pub mod field {
    pub const OWNER: &str = "owner";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const VIDEO_FILE: &str = "videoFile";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const DURATION: &str = "duration";
    pub const VIEWS: &str = "views";
    pub const IS_PUBLISHED: &str = "isPublished";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,

    /// Owning user
    pub owner: String,

    pub title: String,

    pub description: String,

    /// Media references produced by the upload collaborator
    pub video_file: String,

    pub thumbnail: String,

    /// Length in seconds
    pub duration: f64,

    #[serde(default)]
    pub views: u64,

    /// Unpublished videos are only listed for their owner
    pub is_published: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Video {
    const COLLECTION: &'static str = "videos";
    const LABEL: &'static str = "Video";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Owned for Video {
    fn owner(&self) -> &str {
        &self.owner
    }
}
