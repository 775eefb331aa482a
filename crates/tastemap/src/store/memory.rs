use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::moderation::{
    NewRestaurant, NewReview, RestaurantSubmission, Review, StatusCounts, StatusFilter,
    StoreError, SubmissionId, SubmissionKind, SubmissionStatus, SubmissionStore,
};
use crate::newsletter::{NewSubscriber, Subscriber, SubscriberStore};

#[derive(Debug, Default)]
struct Tables {
    next_restaurant_id: i64,
    next_review_id: i64,
    next_subscriber_id: i64,
    restaurants: BTreeMap<SubmissionId, RestaurantSubmission>,
    reviews: BTreeMap<SubmissionId, Review>,
    subscribers: BTreeMap<i64, Subscriber>,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Process-local store used by tests and the CLI demo. Cloning shares state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn create_restaurant(
        &self,
        restaurant: NewRestaurant,
    ) -> Result<RestaurantSubmission, StoreError> {
        let mut tables = self.lock()?;
        let id = SubmissionId(next(&mut tables.next_restaurant_id));
        let record = RestaurantSubmission::from_new(id, Utc::now(), restaurant);
        tables.restaurants.insert(id, record.clone());
        Ok(record)
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let mut tables = self.lock()?;
        let id = SubmissionId(next(&mut tables.next_review_id));
        let record = Review::from_new(id, Utc::now(), review);
        tables.reviews.insert(id, record.clone());
        Ok(record)
    }

    async fn list_restaurants(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<RestaurantSubmission>, StoreError> {
        let tables = self.lock()?;
        let mut records: Vec<_> = tables
            .restaurants
            .values()
            .filter(|record| filter.matches(record.status))
            .cloned()
            .collect();
        records.sort_by_key(|record| Reverse((record.submitted_at, record.id)));
        Ok(records)
    }

    async fn list_reviews(&self, filter: StatusFilter) -> Result<Vec<Review>, StoreError> {
        let tables = self.lock()?;
        let mut records: Vec<_> = tables
            .reviews
            .values()
            .filter(|record| filter.matches(record.status))
            .cloned()
            .collect();
        records.sort_by_key(|record| Reverse((record.submitted_at, record.id)));
        Ok(records)
    }

    async fn get_restaurant(&self, id: SubmissionId) -> Result<RestaurantSubmission, StoreError> {
        let tables = self.lock()?;
        tables.restaurants.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_review(&self, id: SubmissionId) -> Result<Review, StoreError> {
        let tables = self.lock()?;
        tables.reviews.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_status(
        &self,
        kind: SubmissionKind,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let slot = match kind {
            SubmissionKind::Restaurant => tables.restaurants.get_mut(&id).map(|r| &mut r.status),
            SubmissionKind::Review => tables.reviews.get_mut(&id).map(|r| &mut r.status),
        };
        match slot {
            Some(current) => {
                *current = status;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, kind: SubmissionKind, id: SubmissionId) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let removed = match kind {
            SubmissionKind::Restaurant => tables.restaurants.remove(&id).is_some(),
            SubmissionKind::Review => tables.reviews.remove(&id).is_some(),
        };
        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn status_counts(&self, kind: SubmissionKind) -> Result<StatusCounts, StoreError> {
        let tables = self.lock()?;
        let mut counts = StatusCounts::default();
        match kind {
            SubmissionKind::Restaurant => tables
                .restaurants
                .values()
                .for_each(|record| counts.record(record.status)),
            SubmissionKind::Review => tables
                .reviews
                .values()
                .for_each(|record| counts.record(record.status)),
        }
        Ok(counts)
    }
}

#[async_trait]
impl SubscriberStore for InMemoryStore {
    async fn create_subscriber(&self, subscriber: NewSubscriber) -> Result<Subscriber, StoreError> {
        let mut tables = self.lock()?;
        if tables
            .subscribers
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&subscriber.email))
        {
            return Err(StoreError::Conflict);
        }
        let id = next(&mut tables.next_subscriber_id);
        let record = Subscriber::from_new(id, Utc::now(), subscriber);
        tables.subscribers.insert(id, record.clone());
        Ok(record)
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let tables = self.lock()?;
        let mut records: Vec<_> = tables.subscribers.values().cloned().collect();
        records.sort_by_key(|record| Reverse((record.subscribed_at, record.id)));
        Ok(records)
    }

    async fn delete_subscriber(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables
            .subscribers
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn subscriber_count(&self) -> Result<u64, StoreError> {
        let tables = self.lock()?;
        Ok(tables.subscribers.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(name: &str) -> NewRestaurant {
        NewRestaurant {
            name: name.to_string(),
            address: "1 Broadway".to_string(),
            city: "Nashville".to_string(),
            county: "Davidson".to_string(),
            cuisine: "Southern".to_string(),
            ..NewRestaurant::default()
        }
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = InMemoryStore::new();
        let first = store.create_restaurant(restaurant("First")).await.unwrap();
        let second = store.create_restaurant(restaurant("Second")).await.unwrap();

        let listed = store.list_restaurants(StatusFilter::All).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn update_status_does_not_create_missing_records() {
        let store = InMemoryStore::new();
        let result = store
            .update_status(
                SubmissionKind::Review,
                SubmissionId(42),
                SubmissionStatus::Approved,
            )
            .await;

        assert!(matches!(result, Err(StoreError::NotFound)));
        assert!(store.list_reviews(StatusFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn kinds_have_independent_id_spaces() {
        let store = InMemoryStore::new();
        let restaurant = store.create_restaurant(restaurant("Only")).await.unwrap();

        let result = store.delete(SubmissionKind::Review, restaurant.id).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
        assert!(store.get_restaurant(restaurant.id).await.is_ok());
    }
}
