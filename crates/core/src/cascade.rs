//! Best-effort removal of records that depend on a deleted parent.
//!
//! Every step runs even when an earlier one fails. Failures are logged and
//! counted in the [`CascadeReport`], never returned: a dangling edge left
//! behind is tolerated by the views, which collapse missing references to
//! `null` or skip them.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vidtube_common::AppResult;
use vidtube_db::entities::{Comment, Like, Playlist, User, comment, like, playlist, user};
use vidtube_db::{DocumentStore, Filter, Repository, Update};

/// Kind of a deleted parent entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Video,
    Comment,
    Tweet,
    Playlist,
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
            Self::Playlist => "playlist",
        };
        f.write_str(name)
    }
}

/// Outcome of one cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Dependent records removed or detached.
    pub removed: u64,
    /// Steps that failed.
    pub failed: u32,
}

impl CascadeReport {
    /// Whether every step succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, kind: ParentKind, id: &str, step: &str, result: AppResult<u64>) {
        match result {
            Ok(n) => self.removed += n,
            Err(e) => {
                self.failed += 1;
                warn!(parent = %kind, id = %id, step, error = %e, "Cascade step failed");
            }
        }
    }

    fn merge(&mut self, other: Self) {
        self.removed += other.removed;
        self.failed += other.failed;
    }
}

/// Removes likes, comments and references left behind by a deleted parent.
#[derive(Clone)]
pub struct CascadeCoordinator {
    likes: Repository<Like>,
    comments: Repository<Comment>,
    playlists: Repository<Playlist>,
    users: Repository<User>,
}

impl CascadeCoordinator {
    /// Create a new cascade coordinator.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            likes: Repository::new(store.clone()),
            comments: Repository::new(store.clone()),
            playlists: Repository::new(store.clone()),
            users: Repository::new(store),
        }
    }

    /// Remove everything that depends on the parent `id`.
    ///
    /// - tweet, comment: their likes
    /// - video: its likes, its comments and their likes, and its id in
    ///   playlists and watch histories
    /// - playlist: its comments and their likes
    pub async fn cascade_delete(&self, kind: ParentKind, id: &str) -> CascadeReport {
        let mut report = CascadeReport::default();

        match kind {
            ParentKind::Tweet => {
                let result = self.likes.delete_many(&Filter::eq(like::field::TWEET, id)).await;
                report.record(kind, id, "likes", result);
            }
            ParentKind::Comment => {
                let result = self.likes.delete_many(&Filter::eq(like::field::COMMENT, id)).await;
                report.record(kind, id, "likes", result);
            }
            ParentKind::Video => {
                let result = self.likes.delete_many(&Filter::eq(like::field::VIDEO, id)).await;
                report.record(kind, id, "likes", result);

                report.merge(self.delete_comments(kind, id, comment::field::VIDEO).await);

                let result = self
                    .playlists
                    .update_many(
                        &Filter::eq(playlist::field::VIDEOS, id),
                        &[Update::pull(playlist::field::VIDEOS, id)],
                    )
                    .await;
                report.record(kind, id, "playlists", result);

                let result = self
                    .users
                    .update_many(
                        &Filter::eq(user::field::WATCH_HISTORY, id),
                        &[Update::pull(user::field::WATCH_HISTORY, id)],
                    )
                    .await;
                report.record(kind, id, "watch history", result);
            }
            ParentKind::Playlist => {
                report.merge(self.delete_comments(kind, id, comment::field::PLAYLIST).await);
            }
        }

        debug!(parent = %kind, id = %id, removed = report.removed, failed = report.failed, "Cascade finished");
        report
    }

    /// Run [`Self::cascade_delete`] on a background task.
    pub fn spawn(&self, kind: ParentKind, id: String) -> JoinHandle<CascadeReport> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.cascade_delete(kind, &id).await })
    }

    async fn delete_comments(&self, kind: ParentKind, id: &str, field: &str) -> CascadeReport {
        let mut report = CascadeReport::default();
        let filter = Filter::eq(field, id);

        let comments = match self.comments.find(&filter).await {
            Ok(comments) => comments,
            Err(e) => {
                report.record(kind, id, "comments", Err(e));
                return report;
            }
        };

        if !comments.is_empty() {
            let ids: Vec<String> = comments.into_iter().map(|c| c.id).collect();
            let result = self
                .likes
                .delete_many(&Filter::is_in(like::field::COMMENT, ids.clone()))
                .await;
            report.record(kind, id, "comment likes", result);

            let result = self
                .comments
                .delete_many(&Filter::is_in(vidtube_db::document::ID, ids))
                .await;
            report.record(kind, id, "comments", result);
        }

        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vidtube_db::entities::{LikeTarget, Tweet};
    use vidtube_db::test_utils::{FlakyStore, fixtures, indexed_store};

    async fn like(store: &Arc<dyn DocumentStore>, id: &str, by: &str, target: LikeTarget) {
        Repository::<Like>::new(store.clone())
            .insert(&Like::new(id.into(), by.into(), &target, Utc::now()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tweet_cascade_removes_only_its_likes() {
        let store = indexed_store().await;
        like(&store, "l1", "u1", LikeTarget::Tweet("t1".into())).await;
        like(&store, "l2", "u2", LikeTarget::Tweet("t1".into())).await;
        like(&store, "l3", "u1", LikeTarget::Tweet("t2".into())).await;

        let report = CascadeCoordinator::new(store.clone())
            .cascade_delete(ParentKind::Tweet, "t1")
            .await;
        assert_eq!(report, CascadeReport { removed: 2, failed: 0 });

        let left = Repository::<Like>::new(store).find(&Filter::All).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "l3");
    }

    #[tokio::test]
    async fn test_video_cascade_detaches_everywhere() {
        let store = indexed_store().await;
        let users = Repository::<User>::new(store.clone());
        let playlists = Repository::<Playlist>::new(store.clone());
        let comments = Repository::<Comment>::new(store.clone());

        let mut viewer = fixtures::user("u1", "viewer");
        viewer.watch_history = vec!["v1".into(), "v2".into()];
        users.insert(&viewer).await.unwrap();
        playlists
            .insert(&fixtures::playlist("p1", "u1", "mix", &["v2", "v1"]))
            .await
            .unwrap();
        comments.insert(&fixtures::comment("c1", "u1", "v1", "nice")).await.unwrap();
        like(&store, "l1", "u1", LikeTarget::Video("v1".into())).await;
        like(&store, "l2", "u1", LikeTarget::Comment("c1".into())).await;

        let report = CascadeCoordinator::new(store.clone())
            .cascade_delete(ParentKind::Video, "v1")
            .await;
        assert!(report.is_complete());

        assert_eq!(users.get_by_id("u1").await.unwrap().watch_history, vec!["v2"]);
        assert_eq!(playlists.get_by_id("p1").await.unwrap().videos, vec!["v2"]);
        assert_eq!(comments.count(&Filter::All).await.unwrap(), 0);
        assert_eq!(Repository::<Like>::new(store).count(&Filter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_step_does_not_stop_others() {
        let inner = indexed_store().await;
        like(&inner, "l1", "u1", LikeTarget::Video("v1".into())).await;
        Repository::<User>::new(inner.clone())
            .insert(&User {
                watch_history: vec!["v1".into()],
                ..fixtures::user("u1", "viewer")
            })
            .await
            .unwrap();

        let flaky: Arc<dyn DocumentStore> = Arc::new(FlakyStore::new(inner.clone(), &["likes"]));
        let report = CascadeCoordinator::new(flaky)
            .cascade_delete(ParentKind::Video, "v1")
            .await;

        assert_eq!(report.failed, 1);
        let user = Repository::<User>::new(inner).get_by_id("u1").await.unwrap();
        assert!(user.watch_history.is_empty());
    }

    #[tokio::test]
    async fn test_spawned_cascade_reports() {
        let store = indexed_store().await;
        Repository::<Tweet>::new(store.clone())
            .insert(&fixtures::tweet("t1", "u1", "hello"))
            .await
            .unwrap();
        like(&store, "l1", "u2", LikeTarget::Tweet("t1".into())).await;

        let report = CascadeCoordinator::new(store)
            .spawn(ParentKind::Tweet, "t1".to_string())
            .await
            .unwrap();
        assert_eq!(report.removed, 1);
    }
}
