//! Comment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Owned};

/// Stored field names.
pub mod field {
    pub const OWNER: &str = "owner";
    pub const VIDEO: &str = "video";
    pub const PLAYLIST: &str = "playlist";
    pub const CONTENT: &str = "content";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// A comment on a video or, in the playlist variant, on a playlist.
///
/// Exactly one of `video` / `playlist` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,

    pub owner: String,

    pub video: Option<String>,

    pub playlist: Option<String>,

    pub content: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Comment {
    const COLLECTION: &'static str = "comments";
    const LABEL: &'static str = "Comment";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Owned for Comment {
    fn owner(&self) -> &str {
        &self.owner
    }
}
