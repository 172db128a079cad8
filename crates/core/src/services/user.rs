//! User service.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator, validate_id};
use vidtube_db::entities::{User, user};
use vidtube_db::{DocumentStore, Filter, Repository};

use crate::view::{ChannelProfile, VideoCard, ViewService, WatchHistory};

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    /// Checked after normalization, see [`validate_username`].
    pub username: String,

    /// Stored lowercased.
    #[validate(email)]
    pub email: String,

    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,

    /// Avatar URL, already uploaded by the media layer.
    pub avatar: Option<String>,

    /// Cover image URL.
    pub cover_image: Option<String>,

    /// Password hash produced by the auth layer.
    pub password: Option<String>,
}

/// Normalize a username: trimmed and lowercased.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Check a normalized username: 3 to 30 characters from `[a-z0-9_.]`.
pub fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AppError::Validation(format!(
            "Username must be {USERNAME_MIN} to {USERNAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
    {
        return Err(AppError::Validation(
            "Username may only contain letters, digits, '_' and '.'".to_string(),
        ));
    }
    Ok(())
}

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    users: Repository<User>,
    views: ViewService,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, views: ViewService) -> Self {
        Self {
            users: Repository::new(store),
            views,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a user.
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;

        let username = normalize_username(&input.username);
        validate_username(&username)?;

        let now = Utc::now();
        let user = User {
            id: self.id_gen.generate(),
            username,
            email: input.email.trim().to_lowercase(),
            full_name: input.full_name.trim().to_string(),
            avatar: input.avatar,
            cover_image: input.cover_image,
            watch_history: Vec::new(),
            password: input.password,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        match self.users.try_insert(&user).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                return Err(AppError::Conflict("Username already taken".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<User> {
        validate_id(id, "user id")?;
        self.users.get_by_id(id).await
    }

    /// Channel page for `username`, with subscription figures relative to `viewer`.
    pub async fn channel_profile(&self, username: &str, viewer: Option<&str>) -> AppResult<ChannelProfile> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }

        self.views
            .build_one(Filter::eq(user::field::USERNAME, username), viewer)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound("Channel does not exist".to_string()),
                other => other,
            })
    }

    /// Videos `user_id` has watched, each with its owner.
    pub async fn watch_history(&self, user_id: &str) -> AppResult<Vec<VideoCard>> {
        validate_id(user_id, "user id")?;

        let history: WatchHistory = self.views.build_one(Filter::id(user_id), None).await?;
        Ok(history.watch_history)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pagination::PageComposer;
    use vidtube_common::PaginationConfig;
    use vidtube_db::test_utils::indexed_store;

    async fn service() -> UserService {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        UserService::new(store, views)
    }

    fn input(username: &str) -> CreateUserInput {
        CreateUserInput {
            username: username.to_string(),
            email: "Someone@Example.com".to_string(),
            full_name: "Some One".to_string(),
            avatar: None,
            cover_image: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_normalizes() {
        let service = service().await;
        let user = service.create_user(input("  Alice_01 ")).await.unwrap();
        assert_eq!(user.username, "alice_01");
        assert_eq!(user.email, "someone@example.com");
    }

    #[tokio::test]
    async fn test_username_is_unique_case_insensitively() {
        let service = service().await;
        service.create_user(input("alice")).await.unwrap();

        let err = service.create_user(input("ALICE")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_username_rejected() {
        let service = service().await;
        let err = service.create_user(input("al ice")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_username_length_checked_after_trim() {
        let service = service().await;
        let too_long = "a".repeat(31);
        for raw in ["    ", "  ab  ", "", too_long.as_str()] {
            let err = service.create_user(input(raw)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{raw:?} was accepted");
        }

        let user = service.create_user(input(&format!("  {}  ", "a".repeat(30)))).await.unwrap();
        assert_eq!(user.username.len(), 30);
    }

    #[tokio::test]
    async fn test_channel_profile_lookup() {
        let service = service().await;
        let user = service.create_user(input("alice")).await.unwrap();

        let profile = service.channel_profile("Alice", None).await.unwrap();
        assert_eq!(profile.id, user.id);
        assert_eq!(profile.subscribers_count, 0);
        assert!(!profile.is_subscribed);

        let err = service.channel_profile("nobody", None).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
