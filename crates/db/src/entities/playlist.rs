//! Playlist entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Owned};

/// Stored field names.
pub mod field {
    pub const OWNER: &str = "owner";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const VIDEOS: &str = "videos";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,

    pub owner: String,

    pub name: String,

    pub description: String,

    /// Video ids in insertion order; membership is a set
    #[serde(default)]
    pub videos: Vec<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Playlist {
    const COLLECTION: &'static str = "playlists";
    const LABEL: &'static str = "Playlist";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Owned for Playlist {
    fn owner(&self) -> &str {
        &self.owner
    }
}
