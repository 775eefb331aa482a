use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::moderation::domain::{
    NewRestaurant, NewReview, PhotoDescriptor, RestaurantSubmission, Review, StatusCounts,
    StatusFilter, SubmissionId, SubmissionKind, SubmissionStatus,
};
use crate::moderation::gate::{RequestContext, StaticTokenGate};
use crate::moderation::repository::{StoreError, SubmissionStore};
use crate::moderation::service::ModerationService;
use crate::newsletter::{NewSubscriber, Subscriber, SubscriberStore};
use crate::store::InMemoryStore;

pub(super) const ADMIN_TOKEN: &str = "moderator-secret-token";

pub(super) type TestService = ModerationService<InMemoryStore, StaticTokenGate>;

pub(super) fn build_service() -> (TestService, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let gate = Arc::new(StaticTokenGate::new(Some(ADMIN_TOKEN.to_string())));
    (ModerationService::new(store.clone(), gate), store)
}

pub(super) fn admin() -> RequestContext {
    RequestContext::with_token(ADMIN_TOKEN)
}

pub(super) fn restaurant(name: &str) -> NewRestaurant {
    NewRestaurant {
        name: name.to_string(),
        address: "412 Main St".to_string(),
        city: "Franklin".to_string(),
        county: "Williamson".to_string(),
        cuisine: "Barbecue".to_string(),
        phone: Some("615-555-0142".to_string()),
        price_range: Some("$$".to_string()),
        amenities: vec!["Outdoor seating".to_string(), "Parking".to_string()],
        ..NewRestaurant::default()
    }
}

pub(super) fn review(restaurant_id: i64, reviewer: &str, rating: i32) -> NewReview {
    NewReview {
        restaurant_id,
        reviewer_name: reviewer.to_string(),
        rating,
        review_text: "Brisket was worth the line.".to_string(),
        visit_date: "2024-05-18".to_string(),
        photos: vec![PhotoDescriptor {
            id: "1716000000000".to_string(),
            name: "plate.jpg".to_string(),
            preview: "data:image/jpeg;base64,AAAA".to_string(),
        }],
    }
}

pub(super) fn admin_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) fn anonymous_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose every call fails as if the database were offline.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

#[async_trait]
impl SubmissionStore for UnavailableStore {
    async fn create_restaurant(
        &self,
        _restaurant: NewRestaurant,
    ) -> Result<RestaurantSubmission, StoreError> {
        offline()
    }

    async fn create_review(&self, _review: NewReview) -> Result<Review, StoreError> {
        offline()
    }

    async fn list_restaurants(
        &self,
        _filter: StatusFilter,
    ) -> Result<Vec<RestaurantSubmission>, StoreError> {
        offline()
    }

    async fn list_reviews(&self, _filter: StatusFilter) -> Result<Vec<Review>, StoreError> {
        offline()
    }

    async fn get_restaurant(&self, _id: SubmissionId) -> Result<RestaurantSubmission, StoreError> {
        offline()
    }

    async fn get_review(&self, _id: SubmissionId) -> Result<Review, StoreError> {
        offline()
    }

    async fn update_status(
        &self,
        _kind: SubmissionKind,
        _id: SubmissionId,
        _status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        offline()
    }

    async fn delete(&self, _kind: SubmissionKind, _id: SubmissionId) -> Result<(), StoreError> {
        offline()
    }

    async fn status_counts(&self, _kind: SubmissionKind) -> Result<StatusCounts, StoreError> {
        offline()
    }
}

#[async_trait]
impl SubscriberStore for UnavailableStore {
    async fn create_subscriber(&self, _subscriber: NewSubscriber) -> Result<Subscriber, StoreError> {
        offline()
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        offline()
    }

    async fn delete_subscriber(&self, _id: i64) -> Result<(), StoreError> {
        offline()
    }

    async fn subscriber_count(&self) -> Result<u64, StoreError> {
        offline()
    }
}
