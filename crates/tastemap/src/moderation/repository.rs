use async_trait::async_trait;

use super::domain::{
    NewRestaurant, NewReview, RestaurantSubmission, Review, StatusCounts, StatusFilter,
    SubmissionId, SubmissionKind, SubmissionStatus,
};

/// Persistence port for restaurant submissions and reviews.
///
/// Implementations assign ids and creation timestamps, always create records
/// as `pending`, and return listings newest first (ties by descending id).
/// `update_status` and `delete` report [`StoreError::NotFound`] when no row
/// was touched and never create records.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create_restaurant(
        &self,
        restaurant: NewRestaurant,
    ) -> Result<RestaurantSubmission, StoreError>;

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError>;

    async fn list_restaurants(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<RestaurantSubmission>, StoreError>;

    async fn list_reviews(&self, filter: StatusFilter) -> Result<Vec<Review>, StoreError>;

    async fn get_restaurant(&self, id: SubmissionId) -> Result<RestaurantSubmission, StoreError>;

    async fn get_review(&self, id: SubmissionId) -> Result<Review, StoreError>;

    async fn update_status(
        &self,
        kind: SubmissionKind,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError>;

    async fn delete(&self, kind: SubmissionKind, id: SubmissionId) -> Result<(), StoreError>;

    async fn status_counts(&self, kind: SubmissionKind) -> Result<StatusCounts, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
