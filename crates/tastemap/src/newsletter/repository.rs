use async_trait::async_trait;

use super::domain::{NewSubscriber, Subscriber};
use crate::moderation::StoreError;

/// Persistence port for newsletter subscribers. E-mail addresses are unique;
/// a second insert for the same address reports [`StoreError::Conflict`].
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn create_subscriber(&self, subscriber: NewSubscriber) -> Result<Subscriber, StoreError>;

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;

    async fn delete_subscriber(&self, id: i64) -> Result<(), StoreError>;

    async fn subscriber_count(&self) -> Result<u64, StoreError>;
}
