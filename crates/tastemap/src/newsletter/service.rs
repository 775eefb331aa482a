use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{plausible_email, NewSubscriber, Subscriber};
use super::repository::SubscriberStore;
use crate::moderation::{AdminGate, RequestContext, StoreError};

/// Sign-up flow plus the admin-only subscriber list.
pub struct NewsletterService<S, G> {
    store: Arc<S>,
    gate: Arc<G>,
}

impl<S, G> Clone for NewsletterService<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S, G> NewsletterService<S, G>
where
    S: SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    pub fn new(store: Arc<S>, gate: Arc<G>) -> Self {
        Self { store, gate }
    }

    pub async fn subscribe(
        &self,
        subscriber: NewSubscriber,
    ) -> Result<Subscriber, NewsletterError> {
        let subscriber = subscriber.normalized();

        let mut missing = Vec::new();
        if subscriber.first_name.is_empty() {
            missing.push("firstName");
        }
        if subscriber.last_name.is_empty() {
            missing.push("lastName");
        }
        if subscriber.email.is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(NewsletterError::MissingFields(missing));
        }
        if !plausible_email(&subscriber.email) {
            return Err(NewsletterError::InvalidEmail(subscriber.email));
        }

        match self.store.create_subscriber(subscriber).await {
            Ok(stored) => {
                info!(id = stored.id, "newsletter subscription stored");
                Ok(stored)
            }
            Err(StoreError::Conflict) => Err(NewsletterError::AlreadySubscribed),
            Err(other) => Err(NewsletterError::Storage(other.to_string())),
        }
    }

    pub async fn subscribers(
        &self,
        context: &RequestContext,
    ) -> Result<Vec<Subscriber>, NewsletterError> {
        self.authorize(context)?;
        self.store
            .list_subscribers()
            .await
            .map_err(|err| NewsletterError::Storage(err.to_string()))
    }

    pub async fn unsubscribe(
        &self,
        context: &RequestContext,
        id: i64,
    ) -> Result<(), NewsletterError> {
        self.authorize(context)?;
        match self.store.delete_subscriber(id).await {
            Ok(()) => {
                info!(id, "newsletter subscriber deleted");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(NewsletterError::NotFound(id)),
            Err(other) => Err(NewsletterError::Storage(other.to_string())),
        }
    }

    pub fn authorize(&self, context: &RequestContext) -> Result<(), NewsletterError> {
        if self.gate.is_authenticated_admin(context) {
            Ok(())
        } else {
            warn!("newsletter admin operation refused without valid session");
            Err(NewsletterError::Unauthorized)
        }
    }
}

/// Error raised by the newsletter service.
#[derive(Debug, thiserror::Error)]
pub enum NewsletterError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    MalformedRequest(String),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("Email already subscribed")]
    AlreadySubscribed,
    #[error("Subscriber not found")]
    NotFound(i64),
    #[error("Authentication required")]
    Unauthorized,
    #[error("storage failure: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::StaticTokenGate;
    use crate::store::InMemoryStore;

    fn service() -> NewsletterService<InMemoryStore, StaticTokenGate> {
        NewsletterService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(StaticTokenGate::new(Some("letters".to_string()))),
        )
    }

    fn signup(email: &str) -> NewSubscriber {
        NewSubscriber {
            first_name: "Dolly".to_string(),
            last_name: "Parton".to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_addresses_conflict_case_insensitively() {
        let service = service();
        service
            .subscribe(signup("dolly@example.com"))
            .await
            .expect("first sign-up succeeds");

        let result = service.subscribe(signup("  Dolly@Example.com ")).await;
        assert!(matches!(result, Err(NewsletterError::AlreadySubscribed)));
    }

    #[tokio::test]
    async fn blank_fields_are_reported_by_form_name() {
        let service = service();
        let result = service
            .subscribe(NewSubscriber {
                first_name: " ".to_string(),
                ..signup("")
            })
            .await;

        match result {
            Err(NewsletterError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["firstName", "email"]);
            }
            other => panic!("expected missing fields, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscriber_list_requires_admin() {
        let service = service();
        service.subscribe(signup("reba@example.com")).await.unwrap();

        assert!(matches!(
            service.subscribers(&RequestContext::anonymous()).await,
            Err(NewsletterError::Unauthorized)
        ));

        let listed = service
            .subscribers(&RequestContext::with_token("letters"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "reba@example.com");
    }

    #[tokio::test]
    async fn unsubscribe_unknown_id_is_not_found() {
        let service = service();
        let result = service
            .unsubscribe(&RequestContext::with_token("letters"), 12)
            .await;
        assert!(matches!(result, Err(NewsletterError::NotFound(12))));
    }
}
