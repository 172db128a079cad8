//! Stored entity types.
//!
//! Every entity is a `camelCase` serde struct stored as one document in its
//! collection. Relationships are plain id fields; nothing stores a
//! back-reference, so reverse lookups and counts are computed on read.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::Comment;
pub use like::{Like, LikeTarget};
pub use playlist::Playlist;
pub use subscription::Subscription;
pub use tweet::Tweet;
pub use user::User;
pub use video::Video;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::document::Document;
use crate::error::{StoreError, StoreResult};

/// A type stored as documents in one collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name.
    const COLLECTION: &'static str;

    /// Human-readable name used in error messages.
    const LABEL: &'static str;

    /// Primary id.
    fn id(&self) -> &str;

    /// Serialize into a document.
    fn to_document(&self) -> StoreResult<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Backend(format!(
                "{} serialized to a non-object value: {other}",
                Self::LABEL
            ))),
        }
    }

    /// Deserialize from a document.
    fn from_document(doc: Document) -> StoreResult<Self> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }
}

/// An entity with exactly one owning user.
pub trait Owned: Entity {
    /// Field holding the owner's user id.
    const OWNER_FIELD: &'static str = "owner";

    /// The owner's user id.
    fn owner(&self) -> &str;
}
