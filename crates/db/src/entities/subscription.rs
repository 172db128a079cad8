//! Subscription edge: `subscriber` is subscribed to `channel`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;

/// Stored field names.
pub mod field {
    pub const SUBSCRIBER: &str = "subscriber";
    pub const CHANNEL: &str = "channel";
    pub const CREATED_AT: &str = "createdAt";
}

/// Fields covered by the edge uniqueness index.
pub const EDGE_KEY: &[&str] = &[field::SUBSCRIBER, field::CHANNEL];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,

    /// The subscribing user
    pub subscriber: String,

    /// The user being subscribed to
    pub channel: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Entity for Subscription {
    const COLLECTION: &'static str = "subscriptions";
    const LABEL: &'static str = "Subscription";

    fn id(&self) -> &str {
        &self.id
    }
}
