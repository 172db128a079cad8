//! User entity (channel owner and viewer).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;

/// Stored field names.
pub mod field {
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const FULL_NAME: &str = "fullName";
    pub const AVATAR: &str = "avatar";
    pub const COVER_IMAGE: &str = "coverImage";
    pub const WATCH_HISTORY: &str = "watchHistory";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Fields safe to embed wherever a user appears as the owner of something.
pub const PUBLIC_FIELDS: &[&str] = &[field::USERNAME, field::FULL_NAME, field::AVATAR];

/// Fields shown on a channel page.
pub const PROFILE_FIELDS: &[&str] = &[
    field::USERNAME,
    field::FULL_NAME,
    field::AVATAR,
    field::COVER_IMAGE,
    field::EMAIL,
    field::CREATED_AT,
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Unique; stored trimmed and lowercased
    pub username: String,

    pub email: String,

    pub full_name: String,

    pub avatar: Option<String>,

    pub cover_image: Option<String>,

    /// Watched video ids, first-watched order, no duplicates
    #[serde(default)]
    pub watch_history: Vec<String>,

    /// Credential material written by the auth layer; never projected into views
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const LABEL: &'static str = "User";

    fn id(&self) -> &str {
        &self.id
    }
}
