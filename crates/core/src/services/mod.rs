//! Business logic services.

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::{CommentInput, CommentService, CommentTarget};
pub use dashboard::DashboardService;
pub use like::LikeService;
pub use playlist::{CreatePlaylistInput, PlaylistService, UpdatePlaylistInput};
pub use subscription::SubscriptionService;
pub use tweet::{TweetInput, TweetService};
pub use user::{CreateUserInput, UserService};
pub use video::{PublishVideoInput, UpdateVideoInput, VideoService};

use std::sync::Arc;

use vidtube_common::PaginationConfig;
use vidtube_db::DocumentStore;

use crate::pagination::PageComposer;
use crate::view::ViewService;

/// Every service, sharing one store.
#[derive(Clone)]
pub struct Services {
    /// Users and channel pages.
    pub users: UserService,
    /// Videos.
    pub videos: VideoService,
    /// Comments on videos and playlists.
    pub comments: CommentService,
    /// Tweets.
    pub tweets: TweetService,
    /// Likes on videos, comments and tweets.
    pub likes: LikeService,
    /// Channel subscriptions.
    pub subscriptions: SubscriptionService,
    /// Playlists.
    pub playlists: PlaylistService,
    /// Channel dashboard.
    pub dashboard: DashboardService,
}

impl Services {
    /// Build every service over `store`, with one shared view service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, pagination: &PaginationConfig) -> Self {
        let views = ViewService::new(store.clone(), PageComposer::new(pagination.clone()));

        Self {
            users: UserService::new(store.clone(), views.clone()),
            videos: VideoService::new(store.clone(), views.clone()),
            comments: CommentService::new(store.clone(), views.clone()),
            tweets: TweetService::new(store.clone(), views.clone()),
            likes: LikeService::new(store.clone(), views.clone()),
            subscriptions: SubscriptionService::new(store.clone(), views.clone()),
            playlists: PlaylistService::new(store, views.clone()),
            dashboard: DashboardService::new(views),
        }
    }
}
