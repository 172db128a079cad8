//! Channel dashboard.

use vidtube_common::{AppError, AppResult, validate_id};
use vidtube_db::Filter;
use vidtube_db::entities::video;

use crate::view::{ChannelStats, ChannelVideo, ViewService};

/// Read-only channel figures for the channel owner.
#[derive(Clone)]
pub struct DashboardService {
    views: ViewService,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(views: ViewService) -> Self {
        Self { views }
    }

    /// Totals for `channel`: videos, views, subscribers and likes on its videos.
    pub async fn channel_stats(&self, channel: &str) -> AppResult<ChannelStats> {
        validate_id(channel, "channel id")?;
        self.views
            .build_one(Filter::id(channel), None)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound("Channel not found".to_string()),
                other => other,
            })
    }

    /// Every video of `channel`, published or not, newest first.
    pub async fn channel_videos(&self, channel: &str) -> AppResult<Vec<ChannelVideo>> {
        validate_id(channel, "channel id")?;
        self.views
            .build_view(Filter::eq(video::field::OWNER, channel), None)
            .await
    }
}
