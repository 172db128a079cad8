//! Unique indexes the core relies on.

use tracing::info;

use crate::entities::{Entity, Like, Subscription, User, like, subscription, user};
use crate::error::StoreResult;
use crate::store::DocumentStore;

/// Create every unique index. Safe to call repeatedly.
///
/// The edge indexes are what keep at most one like per (liker, target) and
/// one subscription per (subscriber, channel) under concurrent toggles.
pub async fn ensure_indexes(store: &dyn DocumentStore) -> StoreResult<()> {
    store
        .create_unique_index(User::COLLECTION, &[user::field::USERNAME])
        .await?;
    store
        .create_unique_index(Like::COLLECTION, like::EDGE_KEY)
        .await?;
    store
        .create_unique_index(Subscription::COLLECTION, subscription::EDGE_KEY)
        .await?;

    info!("Unique indexes ensured");
    Ok(())
}
