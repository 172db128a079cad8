//! Like and subscription toggles.
//!
//! A toggle looks the (actor, target) edge up and removes it when present,
//! otherwise creates it. The unique index on each edge collection is what
//! keeps a pair single-valued when two toggles race; losing the insert race is
//! reported as [`ToggleOutcome::AlreadyExisted`], never as an error.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use vidtube_common::{AppError, AppResult, IdGenerator, validate_id};
use vidtube_db::entities::{Entity, Like, LikeTarget, Subscription, like, subscription};
use vidtube_db::{DocumentStore, Filter, Repository};

/// The edge a toggle acts on, seen from the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    /// Like of a video, comment or tweet.
    Like(LikeTarget),
    /// Subscription to a channel (user id).
    Subscription(String),
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The edge was created.
    Created,
    /// A concurrent toggle created the edge first.
    AlreadyExisted,
    /// The edge was removed.
    Removed,
}

impl ToggleOutcome {
    /// Whether the edge exists after the toggle.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Created | Self::AlreadyExisted)
    }
}

/// Edge state after a toggle, as returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleState {
    pub present: bool,
}

impl From<ToggleOutcome> for ToggleState {
    fn from(outcome: ToggleOutcome) -> Self {
        Self {
            present: outcome.is_present(),
        }
    }
}

/// Creates or removes like and subscription edges.
#[derive(Clone)]
pub struct ToggleManager {
    likes: Repository<Like>,
    subscriptions: Repository<Subscription>,
    id_gen: IdGenerator,
}

impl ToggleManager {
    /// Create a new toggle manager.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            likes: Repository::new(store.clone()),
            subscriptions: Repository::new(store),
            id_gen: IdGenerator::new(),
        }
    }

    /// Check identifiers, and reject subscribing to oneself.
    ///
    /// Needs no store access, so callers can run it before checking that
    /// the target exists.
    pub fn validate(actor: &str, target: &EdgeTarget) -> AppResult<()> {
        validate_id(actor, "user id")?;
        match target {
            EdgeTarget::Like(liked) => validate_id(liked.id(), &format!("{} id", liked.kind())),
            EdgeTarget::Subscription(channel) => {
                validate_id(channel, "channel id")?;
                if actor == channel {
                    return Err(AppError::Validation(
                        "Cannot subscribe to your own channel".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Flip the edge between `actor` and `target`.
    pub async fn toggle(&self, actor: &str, target: &EdgeTarget) -> AppResult<ToggleOutcome> {
        Self::validate(actor, target)?;

        let outcome = match target {
            EdgeTarget::Like(liked) => {
                let key = Filter::and([Filter::eq(like::field::LIKED_BY, actor), liked.filter()]);
                let edge = Like::new(self.id_gen.generate(), actor.to_string(), liked, Utc::now());
                self.toggle_edge(&self.likes, key, edge).await?
            }
            EdgeTarget::Subscription(channel) => {
                let key = Filter::and([
                    Filter::eq(subscription::field::SUBSCRIBER, actor),
                    Filter::eq(subscription::field::CHANNEL, channel.as_str()),
                ]);
                let edge = Subscription {
                    id: self.id_gen.generate(),
                    subscriber: actor.to_string(),
                    channel: channel.clone(),
                    created_at: Utc::now(),
                };
                self.toggle_edge(&self.subscriptions, key, edge).await?
            }
        };

        debug!(actor = %actor, target = ?target, outcome = ?outcome, "Toggled edge");
        Ok(outcome)
    }

    async fn toggle_edge<E: Entity>(
        &self,
        repo: &Repository<E>,
        key: Filter,
        edge: E,
    ) -> AppResult<ToggleOutcome> {
        if let Some(existing) = repo.find_one(&key).await? {
            // A concurrent remove may already have taken it; either way it is gone.
            repo.delete_one(&Filter::id(existing.id())).await?;
            return Ok(ToggleOutcome::Removed);
        }

        match repo.try_insert(&edge).await {
            Ok(()) => Ok(ToggleOutcome::Created),
            Err(e) if e.is_duplicate_key() => Ok(ToggleOutcome::AlreadyExisted),
            Err(e) => Err(e.into()),
        }
    }
}
