use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    NewRestaurant, NewReview, StatusFilter, SubmissionId, SubmissionKind, SubmissionStatus,
};
use super::gate::{AdminGate, RequestContext};
use super::repository::SubmissionStore;
use super::service::{ModerationError, ModerationService};
use super::validation::ValidationError;
use crate::newsletter::SubscriberStore;

type SharedService<S, G> = Arc<ModerationService<S, G>>;

/// Router builder exposing the public catalogue and the admin moderation API.
pub fn moderation_router<S, G>(service: SharedService<S, G>) -> Router
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    Router::new()
        .route("/api/restaurants/submit", post(submit_restaurant::<S, G>))
        .route("/api/restaurants/approved", get(approved_restaurants::<S, G>))
        .route("/api/reviews/submit", post(submit_review::<S, G>))
        .route("/api/reviews/approved", get(approved_reviews::<S, G>))
        .route(
            "/api/admin/restaurant-submissions",
            get(admin_restaurants::<S, G>),
        )
        .route(
            "/api/admin/restaurant-submissions/:id",
            get(admin_restaurant::<S, G>)
                .put(update_restaurant_status::<S, G>)
                .delete(delete_restaurant::<S, G>),
        )
        .route(
            "/api/admin/restaurant-submissions/:id/approve",
            post(approve_restaurant::<S, G>),
        )
        .route(
            "/api/admin/restaurant-submissions/:id/reject",
            post(reject_restaurant::<S, G>),
        )
        .route("/api/admin/reviews", get(admin_reviews::<S, G>))
        .route(
            "/api/admin/reviews/:id",
            get(admin_review::<S, G>)
                .put(update_review_status::<S, G>)
                .delete(delete_review::<S, G>),
        )
        .route("/api/admin/reviews/:id/approve", post(approve_review::<S, G>))
        .route("/api/admin/reviews/:id/reject", post(reject_review::<S, G>))
        .with_state(service)
}

/// Dashboard counters; needs a store that also tracks newsletter subscribers.
pub fn stats_router<S, G>(service: SharedService<S, G>) -> Router
where
    S: SubmissionStore + SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    Router::new()
        .route("/api/admin/stats", get(dashboard_stats::<S, G>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) status: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<StatusFilter, ModerationError> {
        match &self.status {
            None => Ok(StatusFilter::All),
            Some(raw) => raw.parse::<StatusFilter>().map_err(|err| {
                ModerationError::from(ValidationError::InvalidStatus(err.to_string()))
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApprovedReviewsQuery {
    pub(crate) restaurant_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    #[serde(default)]
    pub(crate) status: String,
}

type PathId = Result<Path<i64>, PathRejection>;

fn malformed(body_text: String) -> ModerationError {
    ModerationError::from(ValidationError::MalformedRequest(body_text))
}

fn path_id(id: PathId) -> Result<SubmissionId, ModerationError> {
    id.map(|Path(id)| SubmissionId(id))
        .map_err(|rejection| malformed(rejection.body_text()))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ModerationError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| malformed(rejection.body_text()))
}

fn list_filter(
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<StatusFilter, ModerationError> {
    query
        .map_err(|rejection| malformed(rejection.body_text()))
        .and_then(|Query(query)| query.filter())
}

pub(crate) fn error_response(err: ModerationError) -> Response {
    let status = match &err {
        ModerationError::Validation(_) => StatusCode::BAD_REQUEST,
        ModerationError::NotFound { .. } => StatusCode::NOT_FOUND,
        ModerationError::Unauthorized => StatusCode::UNAUTHORIZED,
        ModerationError::Conflict => StatusCode::CONFLICT,
        ModerationError::Storage(detail) => {
            error!(%detail, "moderation storage failure");
            let payload = json!({ "error": "Database error" });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn submit_restaurant<S, G>(
    State(service): State<SharedService<S, G>>,
    payload: Result<Json<NewRestaurant>, JsonRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let result = match json_body(payload) {
        Ok(restaurant) => service.submit_restaurant(restaurant).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(stored) => {
            let payload = json!({
                "success": true,
                "message": "Restaurant submitted successfully! It will be reviewed and added to the directory.",
                "id": stored.id,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_review<S, G>(
    State(service): State<SharedService<S, G>>,
    payload: Result<Json<NewReview>, JsonRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let result = match json_body(payload) {
        Ok(review) => service.submit_review(review).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(stored) => {
            let payload = json!({
                "success": true,
                "message": "Review submitted successfully! It will be reviewed before appearing on the site.",
                "id": stored.id,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approved_restaurants<S, G>(
    State(service): State<SharedService<S, G>>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    match service.public_restaurants().await {
        Ok(restaurants) => (StatusCode::OK, Json(restaurants)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approved_reviews<S, G>(
    State(service): State<SharedService<S, G>>,
    query: Result<Query<ApprovedReviewsQuery>, QueryRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let result = match query {
        Ok(Query(query)) => service.public_reviews(query.restaurant_id).await,
        Err(rejection) => Err(malformed(rejection.body_text())),
    };
    match result {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(err) => error_response(err),
    }
}

// Every admin handler checks the gate before looking at the path, query or
// body, so anonymous callers see 401 whatever they send.

pub(crate) async fn admin_restaurants<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(&headers);
    let filter = service
        .authorize(&context, "list restaurants")
        .and_then(|()| list_filter(query));
    let result = match filter {
        Ok(filter) => service.admin_restaurants(&context, filter).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(restaurants) => (StatusCode::OK, Json(restaurants)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_reviews<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(&headers);
    let filter = service
        .authorize(&context, "list reviews")
        .and_then(|()| list_filter(query));
    let result = match filter {
        Ok(filter) => service.admin_reviews(&context, filter).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_restaurant<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(&headers);
    let id = service
        .authorize(&context, "get restaurant")
        .and_then(|()| path_id(id));
    let result = match id {
        Ok(id) => service.admin_restaurant(&context, id).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(restaurant) => (StatusCode::OK, Json(restaurant)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_review<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(&headers);
    let id = service
        .authorize(&context, "get review")
        .and_then(|()| path_id(id));
    let result = match id {
        Ok(id) => service.admin_review(&context, id).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn apply_status<S, G>(
    service: &ModerationService<S, G>,
    headers: &HeaderMap,
    kind: SubmissionKind,
    id: PathId,
    status: impl FnOnce() -> Result<SubmissionStatus, ModerationError>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(headers);
    let target = service
        .authorize(&context, "update status")
        .and_then(|()| path_id(id))
        .and_then(|id| status().map(|status| (id, status)));
    let (id, status) = match target {
        Ok(target) => target,
        Err(err) => return error_response(err),
    };

    match service.set_status(&context, kind, id, status).await {
        Ok(()) => {
            let message = match kind {
                SubmissionKind::Restaurant => "Status updated successfully",
                SubmissionKind::Review => "Review status updated successfully",
            };
            let payload = json!({
                "success": true,
                "message": message,
                "id": id,
                "status": status,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn parse_status(
    update: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<SubmissionStatus, ModerationError> {
    json_body(update)?
        .status
        .parse::<SubmissionStatus>()
        .map_err(|err| ModerationError::from(ValidationError::InvalidStatus(err.to_string())))
}

pub(crate) async fn update_restaurant_status<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
    update: Result<Json<StatusUpdate>, JsonRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let status = || parse_status(update);
    apply_status(&service, &headers, SubmissionKind::Restaurant, id, status).await
}

pub(crate) async fn update_review_status<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
    update: Result<Json<StatusUpdate>, JsonRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let status = || parse_status(update);
    apply_status(&service, &headers, SubmissionKind::Review, id, status).await
}

pub(crate) async fn approve_restaurant<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let status = || Ok(SubmissionStatus::Approved);
    apply_status(&service, &headers, SubmissionKind::Restaurant, id, status).await
}

pub(crate) async fn reject_restaurant<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let status = || Ok(SubmissionStatus::Rejected);
    apply_status(&service, &headers, SubmissionKind::Restaurant, id, status).await
}

pub(crate) async fn approve_review<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let status = || Ok(SubmissionStatus::Approved);
    apply_status(&service, &headers, SubmissionKind::Review, id, status).await
}

pub(crate) async fn reject_review<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let status = || Ok(SubmissionStatus::Rejected);
    apply_status(&service, &headers, SubmissionKind::Review, id, status).await
}

async fn remove<S, G>(
    service: &ModerationService<S, G>,
    headers: &HeaderMap,
    kind: SubmissionKind,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(headers);
    let id = match service
        .authorize(&context, "delete")
        .and_then(|()| path_id(id))
    {
        Ok(id) => id,
        Err(err) => return error_response(err),
    };

    match service.remove(&context, kind, id).await {
        Ok(()) => {
            let message = match kind {
                SubmissionKind::Restaurant => "Submission deleted successfully",
                SubmissionKind::Review => "Review deleted successfully",
            };
            let payload = json!({ "success": true, "message": message, "id": id });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_restaurant<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    remove(&service, &headers, SubmissionKind::Restaurant, id).await
}

pub(crate) async fn delete_review<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: PathId,
) -> Response
where
    S: SubmissionStore + 'static,
    G: AdminGate + 'static,
{
    remove(&service, &headers, SubmissionKind::Review, id).await
}

pub(crate) async fn dashboard_stats<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
) -> Response
where
    S: SubmissionStore + SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(&headers);
    match service.dashboard_stats(&context).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}
