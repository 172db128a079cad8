//! Subscription service.

use std::sync::Arc;

use vidtube_common::{AppError, AppResult, validate_id};
use vidtube_db::entities::{User, subscription};
use vidtube_db::{DocumentStore, Filter, Repository};

use crate::toggle::{EdgeTarget, ToggleManager, ToggleState};
use crate::view::{SubscribedChannel, SubscriberView, ViewService};

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    users: Repository<User>,
    toggles: ToggleManager,
    views: ViewService,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, views: ViewService) -> Self {
        Self {
            users: Repository::new(store.clone()),
            toggles: ToggleManager::new(store),
            views,
        }
    }

    /// Subscribe `actor` to `channel`, or unsubscribe if already subscribed.
    pub async fn toggle_subscription(&self, actor: &str, channel: &str) -> AppResult<ToggleState> {
        let target = EdgeTarget::Subscription(channel.to_string());
        ToggleManager::validate(actor, &target)?;

        if !self.users.exists(&Filter::id(channel)).await? {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }

        Ok(self.toggles.toggle(actor, &target).await?.into())
    }

    /// Subscribers of `channel`, each with their own subscriber count and
    /// whether `viewer` subscribes to them.
    pub async fn channel_subscribers(
        &self,
        channel: &str,
        viewer: Option<&str>,
    ) -> AppResult<Vec<SubscriberView>> {
        validate_id(channel, "channel id")?;
        self.views
            .build_view(Filter::eq(subscription::field::CHANNEL, channel), viewer)
            .await
    }

    /// Channels `subscriber` subscribes to, each with its latest published video.
    pub async fn subscribed_channels(&self, subscriber: &str) -> AppResult<Vec<SubscribedChannel>> {
        validate_id(subscriber, "user id")?;
        self.views
            .build_view(Filter::eq(subscription::field::SUBSCRIBER, subscriber), None)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pagination::PageComposer;
    use vidtube_common::{IdGenerator, PaginationConfig};
    use vidtube_db::entities::Video;
    use vidtube_db::test_utils::{fixtures, indexed_store};

    #[tokio::test]
    async fn test_subscription_views() {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        let service = SubscriptionService::new(store.clone(), views);
        let id_gen = IdGenerator::new();
        let (alice, bob, carol) = (id_gen.generate(), id_gen.generate(), id_gen.generate());

        let users = Repository::<User>::new(store.clone());
        for (id, name) in [(&alice, "alice"), (&bob, "bob"), (&carol, "carol")] {
            users.insert(&fixtures::user(id, name)).await.unwrap();
        }
        let videos = Repository::<Video>::new(store);
        videos
            .insert(&fixtures::video(&id_gen.generate(), &alice, "Old", true, 60))
            .await
            .unwrap();
        videos
            .insert(&fixtures::video(&id_gen.generate(), &alice, "New", true, 1))
            .await
            .unwrap();
        videos
            .insert(&fixtures::video(&id_gen.generate(), &alice, "Draft", false, 0))
            .await
            .unwrap();

        // bob and carol subscribe to alice; carol also subscribes to bob.
        service.toggle_subscription(&bob, &alice).await.unwrap();
        service.toggle_subscription(&carol, &alice).await.unwrap();
        service.toggle_subscription(&carol, &bob).await.unwrap();

        let subscribers = service.channel_subscribers(&alice, Some(&carol)).await.unwrap();
        assert_eq!(subscribers.len(), 2);
        let bob_entry = subscribers
            .iter()
            .find(|s| s.subscriber_details.id == bob)
            .unwrap();
        assert_eq!(bob_entry.subscriber_details.subscribers_count, 1);
        assert!(bob_entry.subscriber_details.is_subscribed);

        let channels = service.subscribed_channels(&bob).await.unwrap();
        assert_eq!(channels.len(), 1);
        let latest = channels[0].channel_details.latest_video.as_ref().unwrap();
        assert_eq!(latest.title, "New");
    }

    #[tokio::test]
    async fn test_unknown_channel_and_self() {
        let store = indexed_store().await;
        let views = ViewService::new(store.clone(), PageComposer::new(PaginationConfig::default()));
        let service = SubscriptionService::new(store, views);
        let id_gen = IdGenerator::new();
        let alice = id_gen.generate();

        let err = service.toggle_subscription(&alice, &alice).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .toggle_subscription(&alice, &id_gen.generate())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
