//! Like edge: `liked_by` likes exactly one video, comment or tweet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::filter::Filter;

/// Stored field names.
pub mod field {
    pub const LIKED_BY: &str = "likedBy";
    pub const VIDEO: &str = "video";
    pub const COMMENT: &str = "comment";
    pub const TWEET: &str = "tweet";
    pub const CREATED_AT: &str = "createdAt";
}

/// Fields covered by the edge uniqueness index.
///
/// The two unused target fields are stored as `null`, so the tuple is unique
/// per (liker, target kind, target id).
pub const EDGE_KEY: &[&str] = &[field::LIKED_BY, field::VIDEO, field::COMMENT, field::TWEET];

/// What a like points at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Video(String),
    Comment(String),
    Tweet(String),
}

impl LikeTarget {
    /// The like field that holds this target's id.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Video(_) => field::VIDEO,
            Self::Comment(_) => field::COMMENT,
            Self::Tweet(_) => field::TWEET,
        }
    }

    /// The target id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => id,
        }
    }

    /// Lower-case kind name for logs and messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Comment(_) => "comment",
            Self::Tweet(_) => "tweet",
        }
    }

    /// Filter selecting every like on this target.
    #[must_use]
    pub fn filter(&self) -> Filter {
        Filter::eq(self.field(), self.id())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,

    /// The liking user
    pub liked_by: String,

    pub video: Option<String>,

    pub comment: Option<String>,

    pub tweet: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Like {
    /// Build a like edge with exactly one target set.
    #[must_use]
    pub fn new(id: String, liked_by: String, target: &LikeTarget, created_at: DateTime<Utc>) -> Self {
        let mut like = Self {
            id,
            liked_by,
            video: None,
            comment: None,
            tweet: None,
            created_at,
        };
        let slot = match target {
            LikeTarget::Video(_) => &mut like.video,
            LikeTarget::Comment(_) => &mut like.comment,
            LikeTarget::Tweet(_) => &mut like.tweet,
        };
        *slot = Some(target.id().to_string());
        like
    }

    /// The single target this like points at.
    #[must_use]
    pub fn target(&self) -> Option<LikeTarget> {
        match (&self.video, &self.comment, &self.tweet) {
            (Some(id), None, None) => Some(LikeTarget::Video(id.clone())),
            (None, Some(id), None) => Some(LikeTarget::Comment(id.clone())),
            (None, None, Some(id)) => Some(LikeTarget::Tweet(id.clone())),
            _ => None,
        }
    }
}

impl Entity for Like {
    const COLLECTION: &'static str = "likes";
    const LABEL: &'static str = "Like";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_exactly_one_target() {
        let target = LikeTarget::Tweet("t1".to_string());
        let like = Like::new("l1".into(), "u1".into(), &target, Utc::now());

        assert_eq!(like.tweet.as_deref(), Some("t1"));
        assert!(like.video.is_none());
        assert!(like.comment.is_none());
        assert_eq!(like.target(), Some(target));
    }

    #[test]
    fn test_document_keeps_null_targets() {
        let like = Like::new(
            "l1".into(),
            "u1".into(),
            &LikeTarget::Video("v1".into()),
            Utc::now(),
        );
        let doc = like.to_document().unwrap_or_default();

        for key in EDGE_KEY {
            assert!(doc.contains_key(*key), "{key} missing from stored like");
        }
        assert!(doc["comment"].is_null());
    }
}
