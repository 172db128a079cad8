//! Owner-scoped mutations.
//!
//! The mutation filters on id and owner together, so a non-owner can never
//! touch the record. A miss is then classified with one existence check:
//! `NotFound` when the record is gone, `NotOwner` when it belongs to someone
//! else. Both map to the same external status.

use vidtube_common::{AppError, AppResult};
use vidtube_db::entities::Owned;
use vidtube_db::{Filter, Repository, Update};

fn scoped<E: Owned>(id: &str, owner: &str) -> Filter {
    Filter::and([Filter::id(id), Filter::eq(E::OWNER_FIELD, owner)])
}

async fn classify_miss<E: Owned>(repo: &Repository<E>, id: &str) -> AppError {
    match repo.exists(&Filter::id(id)).await {
        Ok(true) => AppError::NotOwner(format!("{} {id} is owned by another user", E::LABEL)),
        Ok(false) => AppError::NotFound(format!("{} not found", E::LABEL)),
        Err(e) => e,
    }
}

/// Apply `updates` to `id` if `owner` owns it, returning the updated entity.
pub async fn update_owned<E: Owned>(
    repo: &Repository<E>,
    id: &str,
    owner: &str,
    updates: &[Update],
) -> AppResult<E> {
    match repo.update_one(&scoped::<E>(id, owner), updates).await? {
        Some(entity) => Ok(entity),
        None => Err(classify_miss(repo, id).await),
    }
}

/// Delete `id` if `owner` owns it, returning the deleted entity.
pub async fn delete_owned<E: Owned>(repo: &Repository<E>, id: &str, owner: &str) -> AppResult<E> {
    match repo.delete_one(&scoped::<E>(id, owner)).await? {
        Some(entity) => Ok(entity),
        None => Err(classify_miss(repo, id).await),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vidtube_db::entities::Tweet;
    use vidtube_db::test_utils::{fixtures, indexed_store};

    #[tokio::test]
    async fn test_owner_mismatch_is_distinguishable() {
        let repo: Repository<Tweet> = Repository::new(indexed_store().await);
        repo.insert(&fixtures::tweet("t1", "u1", "hello")).await.unwrap();

        let err = update_owned(&repo, "t1", "u2", &[Update::set("content", "hijack")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotOwner(_)));
        assert_eq!(err.status_code(), AppError::NotFound(String::new()).status_code());

        let err = delete_owned(&repo, "t9", "u1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let tweet = update_owned(&repo, "t1", "u1", &[Update::set("content", "edited")])
            .await
            .unwrap();
        assert_eq!(tweet.content, "edited");

        delete_owned(&repo, "t1", "u1").await.unwrap();
        assert!(repo.find_by_id("t1").await.unwrap().is_none());
    }
}
