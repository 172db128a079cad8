//! Tweet entity (short text post on a channel).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Owned};

/// Stored field names.
pub mod field {
    pub const OWNER: &str = "owner";
    pub const CONTENT: &str = "content";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: String,
    pub owner: String,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Tweet {
    const COLLECTION: &'static str = "tweets";
    const LABEL: &'static str = "Tweet";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Owned for Tweet {
    fn owner(&self) -> &str {
        &self.owner
    }
}
