use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    DashboardStats, NewRestaurant, NewReview, PublicRestaurant, PublicReview,
    RestaurantSubmission, Review, StatusFilter, SubmissionId, SubmissionKind, SubmissionStatus,
};
use super::gate::{AdminGate, RequestContext};
use super::repository::{StoreError, SubmissionStore};
use super::validation::{validate_restaurant, validate_review, ValidationError};
use crate::newsletter::SubscriberStore;

/// Policy layer around submission status and visibility.
///
/// Admin operations consult the [`AdminGate`] before touching the store.
/// Status is freely settable among the three values; nothing is retried.
pub struct ModerationService<S, G> {
    store: Arc<S>,
    gate: Arc<G>,
}

impl<S, G> Clone for ModerationService<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S, G> ModerationService<S, G>
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    pub fn new(store: Arc<S>, gate: Arc<G>) -> Self {
        Self { store, gate }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validate and store a restaurant submission as `pending`.
    pub async fn submit_restaurant(
        &self,
        restaurant: NewRestaurant,
    ) -> Result<RestaurantSubmission, ModerationError> {
        validate_restaurant(&restaurant)?;
        let stored = self.store.create_restaurant(restaurant).await?;
        info!(id = %stored.id, name = %stored.name, "restaurant submitted for review");
        Ok(stored)
    }

    /// Validate and store a review as `pending`.
    pub async fn submit_review(&self, review: NewReview) -> Result<Review, ModerationError> {
        validate_review(&review)?;
        let stored = self.store.create_review(review).await?;
        info!(
            id = %stored.id,
            restaurant_id = stored.restaurant_id,
            "review submitted for moderation"
        );
        Ok(stored)
    }

    pub async fn approve(
        &self,
        context: &RequestContext,
        kind: SubmissionKind,
        id: SubmissionId,
    ) -> Result<(), ModerationError> {
        self.set_status(context, kind, id, SubmissionStatus::Approved)
            .await
    }

    pub async fn reject(
        &self,
        context: &RequestContext,
        kind: SubmissionKind,
        id: SubmissionId,
    ) -> Result<(), ModerationError> {
        self.set_status(context, kind, id, SubmissionStatus::Rejected)
            .await
    }

    /// Overwrite the status of one record. Any status may replace any other,
    /// including itself; last write wins.
    pub async fn set_status(
        &self,
        context: &RequestContext,
        kind: SubmissionKind,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), ModerationError> {
        self.authorize(context, "update status")?;

        match self.store.update_status(kind, id, status).await {
            Ok(()) => {
                info!(%kind, %id, %status, "submission status updated");
                Ok(())
            }
            Err(StoreError::NotFound) => {
                warn!(%kind, %id, %status, "status update for unknown submission");
                Err(ModerationError::NotFound { kind, id })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Permanently delete a record from any state.
    pub async fn remove(
        &self,
        context: &RequestContext,
        kind: SubmissionKind,
        id: SubmissionId,
    ) -> Result<(), ModerationError> {
        self.authorize(context, "delete")?;

        match self.store.delete(kind, id).await {
            Ok(()) => {
                info!(%kind, %id, "submission deleted");
                Ok(())
            }
            Err(StoreError::NotFound) => {
                warn!(%kind, %id, "delete for unknown submission");
                Err(ModerationError::NotFound { kind, id })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Approved restaurants with rating aggregates over approved reviews.
    pub async fn public_restaurants(&self) -> Result<Vec<PublicRestaurant>, ModerationError> {
        let approved = StatusFilter::Only(SubmissionStatus::Approved);
        let restaurants = self.store.list_restaurants(approved).await?;
        let reviews = self.store.list_reviews(approved).await?;

        let mut totals: HashMap<i64, (i64, u32)> = HashMap::new();
        for review in &reviews {
            let entry = totals.entry(review.restaurant_id).or_insert((0, 0));
            entry.0 += i64::from(review.rating);
            entry.1 += 1;
        }

        Ok(restaurants
            .into_iter()
            .map(|restaurant| {
                let (sum, count) = totals.get(&restaurant.id.0).copied().unwrap_or((0, 0));
                let rating = if count == 0 {
                    0.0
                } else {
                    sum as f32 / count as f32
                };
                PublicRestaurant {
                    restaurant,
                    rating,
                    review_count: count,
                }
            })
            .collect())
    }

    /// Approved reviews stripped to their public fields.
    pub async fn public_reviews(
        &self,
        restaurant_id: Option<i64>,
    ) -> Result<Vec<PublicReview>, ModerationError> {
        let reviews = self
            .store
            .list_reviews(StatusFilter::Only(SubmissionStatus::Approved))
            .await?;

        Ok(reviews
            .iter()
            .filter(|review| review.status.is_public())
            .filter(|review| restaurant_id.map_or(true, |id| review.restaurant_id == id))
            .map(Review::public_view)
            .collect())
    }

    pub async fn admin_restaurants(
        &self,
        context: &RequestContext,
        filter: StatusFilter,
    ) -> Result<Vec<RestaurantSubmission>, ModerationError> {
        self.authorize(context, "list restaurants")?;
        Ok(self.store.list_restaurants(filter).await?)
    }

    pub async fn admin_reviews(
        &self,
        context: &RequestContext,
        filter: StatusFilter,
    ) -> Result<Vec<Review>, ModerationError> {
        self.authorize(context, "list reviews")?;
        Ok(self.store.list_reviews(filter).await?)
    }

    pub async fn admin_restaurant(
        &self,
        context: &RequestContext,
        id: SubmissionId,
    ) -> Result<RestaurantSubmission, ModerationError> {
        self.authorize(context, "get restaurant")?;
        self.store
            .get_restaurant(id)
            .await
            .map_err(|err| ModerationError::from_store(err, SubmissionKind::Restaurant, id))
    }

    pub async fn admin_review(
        &self,
        context: &RequestContext,
        id: SubmissionId,
    ) -> Result<Review, ModerationError> {
        self.authorize(context, "get review")?;
        self.store
            .get_review(id)
            .await
            .map_err(|err| ModerationError::from_store(err, SubmissionKind::Review, id))
    }

    pub fn authorize(
        &self,
        context: &RequestContext,
        operation: &'static str,
    ) -> Result<(), ModerationError> {
        if self.gate.is_authenticated_admin(context) {
            Ok(())
        } else {
            warn!(operation, "admin operation refused without valid session");
            Err(ModerationError::Unauthorized)
        }
    }
}

impl<S, G> ModerationService<S, G>
where
    S: SubmissionStore + SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    pub async fn dashboard_stats(
        &self,
        context: &RequestContext,
    ) -> Result<DashboardStats, ModerationError> {
        self.authorize(context, "dashboard stats")?;
        let restaurants = self
            .store
            .status_counts(SubmissionKind::Restaurant)
            .await?;
        let reviews = self.store.status_counts(SubmissionKind::Review).await?;
        let subscribers = self
            .store
            .subscriber_count()
            .await
            .map_err(|err| ModerationError::Storage(err.to_string()))?;
        Ok(DashboardStats::new(restaurants, reviews, subscribers))
    }
}

/// Error raised by the moderation service.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{} not found", .kind.noun())]
    NotFound {
        kind: SubmissionKind,
        id: SubmissionId,
    },
    #[error("Authentication required")]
    Unauthorized,
    #[error("record already exists")]
    Conflict,
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ModerationError {
    fn from_store(err: StoreError, kind: SubmissionKind, id: SubmissionId) -> Self {
        match err {
            StoreError::NotFound => ModerationError::NotFound { kind, id },
            other => other.into(),
        }
    }

    /// Only storage failures are worth re-issuing.
    pub fn is_transient(&self) -> bool {
        matches!(self, ModerationError::Storage(_))
    }
}

impl From<StoreError> for ModerationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict => ModerationError::Conflict,
            // Callers that know the target map NotFound themselves.
            StoreError::NotFound => ModerationError::Storage(value.to_string()),
            StoreError::Unavailable(message) => ModerationError::Storage(message),
        }
    }
}
