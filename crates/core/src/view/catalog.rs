//! The read models served by the services.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vidtube_db::entities::{
    Comment, Entity, Like, Playlist, Subscription, Tweet, User, Video, comment, like, playlist,
    subscription, tweet, user, video,
};
use vidtube_db::{Expr, Filter, SortKey, document};

use super::{EdgeView, Listing, View, ViewBuilder};

const OWNER_DETAILS: &str = "ownerDetails";
const LIKES_COUNT: &str = "likesCount";
const IS_LIKED: &str = "isLiked";
const SUBSCRIBERS_COUNT: &str = "subscribersCount";
const IS_SUBSCRIBED: &str = "isSubscribed";

/// Published videos, plus the viewer's own unpublished ones.
pub(crate) fn published_or_owned(viewer: Option<&str>) -> Filter {
    let published = Filter::eq(video::field::IS_PUBLISHED, true);
    match viewer {
        Some(viewer) => Filter::or([published, Filter::eq(video::field::OWNER, viewer)]),
        None => published,
    }
}

fn newest_first() -> Vec<SortKey> {
    vec![SortKey::desc("createdAt"), SortKey::desc(document::ID)]
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDetails {
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Public profile with the channel's subscriber count and the viewer's
/// subscription state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub subscribers_count: u64,
    pub is_subscribed: bool,
}

fn channel_summary(viewer: Option<&str>) -> ViewBuilder {
    ViewBuilder::new()
        .edges(
            EdgeView::subscribers()
                .count_as(SUBSCRIBERS_COUNT)
                .flag_as(IS_SUBSCRIBED, viewer),
        )
        .project(&[
            user::field::USERNAME,
            user::field::FULL_NAME,
            user::field::AVATAR,
            SUBSCRIBERS_COUNT,
            IS_SUBSCRIBED,
        ])
}

/// A video with its owner, as shown in lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    #[serde(flatten)]
    pub video: Video,
    pub owner_details: Option<OwnerDetails>,
}

impl View for VideoCard {
    type Source = Video;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new().owner(video::field::OWNER, OWNER_DETAILS)
    }
}

impl Listing for VideoCard {
    const SEARCH_FIELDS: &'static [&'static str] = &[video::field::TITLE, video::field::DESCRIPTION];
    const SORT_FIELDS: &'static [&'static str] = &[
        video::field::CREATED_AT,
        video::field::VIEWS,
        video::field::TITLE,
        video::field::DURATION,
    ];
    const DEFAULT_SORT: &'static str = video::field::CREATED_AT;

    fn visibility(viewer: Option<&str>) -> Filter {
        published_or_owned(viewer)
    }
}

/// Full video page: likes, viewer flags and the owner's channel summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: Video,
    pub likes_count: u64,
    pub is_liked: bool,
    pub owner_details: Option<ChannelSummary>,
}

impl View for VideoDetail {
    type Source = Video;

    fn plan(viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .edges(
                EdgeView::likes(like::field::VIDEO)
                    .count_as(LIKES_COUNT)
                    .flag_as(IS_LIKED, viewer),
            )
            .join_one(
                OWNER_DETAILS,
                User::COLLECTION,
                video::field::OWNER,
                document::ID,
                channel_summary(viewer),
            )
    }
}

/// A video in its owner's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideo {
    #[serde(flatten)]
    pub video: Video,
    pub likes_count: u64,
}

impl View for ChannelVideo {
    type Source = Video;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .edges(EdgeView::likes(like::field::VIDEO).count_as(LIKES_COUNT))
            .sort(newest_first())
    }
}

/// A comment with its author and likes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub owner_details: Option<OwnerDetails>,
    pub likes_count: u64,
    pub is_liked: bool,
}

impl View for CommentView {
    type Source = Comment;

    fn plan(viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .owner(comment::field::OWNER, OWNER_DETAILS)
            .edges(
                EdgeView::likes(like::field::COMMENT)
                    .count_as(LIKES_COUNT)
                    .flag_as(IS_LIKED, viewer),
            )
    }
}

impl Listing for CommentView {
    const SEARCH_FIELDS: &'static [&'static str] = &[comment::field::CONTENT];
    const SORT_FIELDS: &'static [&'static str] = &[comment::field::CREATED_AT];
    const DEFAULT_SORT: &'static str = comment::field::CREATED_AT;
}

/// A tweet with its author and likes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    #[serde(flatten)]
    pub tweet: Tweet,
    pub owner_details: Option<OwnerDetails>,
    pub likes_count: u64,
    pub is_liked: bool,
}

impl View for TweetView {
    type Source = Tweet;

    fn plan(viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .owner(tweet::field::OWNER, OWNER_DETAILS)
            .edges(
                EdgeView::likes(like::field::TWEET)
                    .count_as(LIKES_COUNT)
                    .flag_as(IS_LIKED, viewer),
            )
    }
}

impl Listing for TweetView {
    const SEARCH_FIELDS: &'static [&'static str] = &[tweet::field::CONTENT];
    const SORT_FIELDS: &'static [&'static str] = &[tweet::field::CREATED_AT];
    const DEFAULT_SORT: &'static str = tweet::field::CREATED_AT;
}

/// A playlist with its videos resolved in playlist order.
///
/// Videos the viewer may not see are left out of `videos` and of the totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub videos: Vec<VideoCard>,
    pub total_videos: u64,
    pub total_views: u64,
    pub owner_details: Option<OwnerDetails>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl View for PlaylistView {
    type Source = Playlist;

    fn plan(viewer: Option<&str>) -> ViewBuilder {
        let videos = ViewBuilder::new()
            .filter(published_or_owned(viewer))
            .owner(video::field::OWNER, OWNER_DETAILS);

        ViewBuilder::new()
            .join_many(
                playlist::field::VIDEOS,
                Video::COLLECTION,
                playlist::field::VIDEOS,
                document::ID,
                videos,
            )
            .compute("totalVideos", Expr::Size(playlist::field::VIDEOS.to_string()))
            .compute("totalViews", Expr::Sum(format!("{}.{}", playlist::field::VIDEOS, video::field::VIEWS)))
            .owner(playlist::field::OWNER, OWNER_DETAILS)
    }
}

/// A playlist with aggregate figures, for a user's playlist list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub total_videos: u64,
    pub total_views: u64,
}

impl View for PlaylistSummary {
    type Source = Playlist;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .join_many(
                "_videos",
                Video::COLLECTION,
                playlist::field::VIDEOS,
                document::ID,
                ViewBuilder::new().project(&[video::field::VIEWS]),
            )
            .compute("totalVideos", Expr::Size("_videos".to_string()))
            .compute("totalViews", Expr::Sum(format!("_videos.{}", video::field::VIEWS)))
            .hide(&["_videos"])
            .sort(newest_first())
    }
}

/// A user's channel page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub subscribers_count: u64,
    pub channels_subscribed_to_count: u64,
    pub is_subscribed: bool,
}

impl View for ChannelProfile {
    type Source = User;

    fn plan(viewer: Option<&str>) -> ViewBuilder {
        let mut fields = user::PROFILE_FIELDS.to_vec();
        fields.extend([SUBSCRIBERS_COUNT, "channelsSubscribedToCount", IS_SUBSCRIBED]);

        ViewBuilder::new()
            .edges(
                EdgeView::subscribers()
                    .count_as(SUBSCRIBERS_COUNT)
                    .flag_as(IS_SUBSCRIBED, viewer),
            )
            .edges(EdgeView::subscribed_to().count_as("channelsSubscribedToCount"))
            .project(&fields)
    }
}

/// A user's watch history, oldest entry first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistory {
    pub id: String,
    pub watch_history: Vec<VideoCard>,
}

impl View for WatchHistory {
    type Source = User;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .join_many(
                user::field::WATCH_HISTORY,
                Video::COLLECTION,
                user::field::WATCH_HISTORY,
                document::ID,
                ViewBuilder::new().owner(video::field::OWNER, OWNER_DETAILS),
            )
            .project(&[user::field::WATCH_HISTORY])
    }
}

/// A like with its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    #[serde(flatten)]
    pub like: Like,
    pub liked_by_details: Option<OwnerDetails>,
}

impl View for LikeView {
    type Source = Like;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .owner(like::field::LIKED_BY, "likedByDetails")
            .sort(newest_first())
    }
}

/// A video the user liked, newest like first.
///
/// Likes whose video no longer exists are skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub liked_video: VideoCard,
}

impl View for LikedVideo {
    type Source = Like;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .join_one(
                "likedVideo",
                Video::COLLECTION,
                like::field::VIDEO,
                document::ID,
                ViewBuilder::new().owner(video::field::OWNER, OWNER_DETAILS),
            )
            .filter(Filter::ne("likedVideo", Value::Null))
            .sort(newest_first())
            .project(&[like::field::CREATED_AT, "likedVideo"])
    }
}

/// A subscriber of a channel, with their own channel summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub subscriber_details: ChannelSummary,
}

impl View for SubscriberView {
    type Source = Subscription;

    fn plan(viewer: Option<&str>) -> ViewBuilder {
        ViewBuilder::new()
            .join_one(
                "subscriberDetails",
                User::COLLECTION,
                subscription::field::SUBSCRIBER,
                document::ID,
                channel_summary(viewer),
            )
            .filter(Filter::ne("subscriberDetails", Value::Null))
            .sort(newest_first())
    }
}

/// A channel the user subscribes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub channel_details: ChannelWithLatest,
}

/// Public channel profile with its most recent published video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelWithLatest {
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub latest_video: Option<Video>,
}

impl View for SubscribedChannel {
    type Source = Subscription;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        let latest = ViewBuilder::new()
            .filter(Filter::eq(video::field::IS_PUBLISHED, true))
            .sort(newest_first())
            .limit(1);
        let channel = ViewBuilder::new()
            .join_one("latestVideo", Video::COLLECTION, document::ID, video::field::OWNER, latest)
            .project(&[
                user::field::USERNAME,
                user::field::FULL_NAME,
                user::field::AVATAR,
                "latestVideo",
            ]);

        ViewBuilder::new()
            .join_one(
                "channelDetails",
                User::COLLECTION,
                subscription::field::CHANNEL,
                document::ID,
                channel,
            )
            .filter(Filter::ne("channelDetails", Value::Null))
            .sort(newest_first())
    }
}

/// Aggregate figures for a channel's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: u64,
    pub total_views: u64,
    pub total_subscribers: u64,
    pub total_likes: u64,
}

impl View for ChannelStats {
    type Source = User;

    fn plan(_viewer: Option<&str>) -> ViewBuilder {
        let videos = ViewBuilder::new()
            .edges(EdgeView::likes(like::field::VIDEO).count_as(LIKES_COUNT))
            .project(&[video::field::VIEWS, LIKES_COUNT]);

        ViewBuilder::new()
            .join_many("_videos", Video::COLLECTION, document::ID, video::field::OWNER, videos)
            .edges(EdgeView::subscribers().count_as("totalSubscribers"))
            .compute("totalVideos", Expr::Size("_videos".to_string()))
            .compute("totalViews", Expr::Sum(format!("_videos.{}", video::field::VIEWS)))
            .compute("totalLikes", Expr::Sum(format!("_videos.{LIKES_COUNT}")))
            .project(&["totalVideos", "totalViews", "totalSubscribers", "totalLikes"])
    }
}
