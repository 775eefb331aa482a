use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::NewSubscriber;
use super::repository::SubscriberStore;
use super::service::{NewsletterError, NewsletterService};
use crate::moderation::{AdminGate, RequestContext};

type SharedService<S, G> = Arc<NewsletterService<S, G>>;

const SUBSCRIBE_FAILED: &str = "Failed to subscribe to newsletter";
const DATABASE_ERROR: &str = "Database error";

pub fn newsletter_router<S, G>(service: SharedService<S, G>) -> Router
where
    S: SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    Router::new()
        .route("/api/newsletter/subscribe", post(subscribe::<S, G>))
        .route(
            "/api/admin/newsletter-subscribers",
            get(list_subscribers::<S, G>),
        )
        .route(
            "/api/admin/newsletter-subscribers/:id",
            delete(delete_subscriber::<S, G>),
        )
        .with_state(service)
}

/// `storage_message` is the only text clients see for storage failures.
pub(crate) fn error_response(err: NewsletterError, storage_message: &'static str) -> Response {
    let status = match &err {
        NewsletterError::MissingFields(_)
        | NewsletterError::MalformedRequest(_)
        | NewsletterError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
        NewsletterError::AlreadySubscribed => StatusCode::CONFLICT,
        NewsletterError::NotFound(_) => StatusCode::NOT_FOUND,
        NewsletterError::Unauthorized => StatusCode::UNAUTHORIZED,
        NewsletterError::Storage(detail) => {
            error!(%detail, "newsletter storage failure");
            let payload = json!({ "error": storage_message });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) async fn subscribe<S, G>(
    State(service): State<SharedService<S, G>>,
    payload: Result<Json<NewSubscriber>, JsonRejection>,
) -> Response
where
    S: SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    let result = match payload {
        Ok(Json(subscriber)) => service.subscribe(subscriber).await,
        Err(rejection) => Err(NewsletterError::MalformedRequest(rejection.body_text())),
    };
    match result {
        Ok(stored) => {
            let payload = json!({
                "success": true,
                "message": "Successfully subscribed to newsletter!",
                "id": stored.id,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err, SUBSCRIBE_FAILED),
    }
}

pub(crate) async fn list_subscribers<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
) -> Response
where
    S: SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(&headers);
    match service.subscribers(&context).await {
        Ok(subscribers) => (StatusCode::OK, Json(subscribers)).into_response(),
        Err(err) => error_response(err, DATABASE_ERROR),
    }
}

pub(crate) async fn delete_subscriber<S, G>(
    State(service): State<SharedService<S, G>>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> Response
where
    S: SubscriberStore + 'static,
    G: AdminGate + 'static,
{
    let context = RequestContext::from_headers(&headers);
    // Gate first so anonymous callers see 401 even with a malformed id.
    let id = match service.authorize(&context).and_then(|()| {
        id.map(|Path(id)| id)
            .map_err(|rejection| NewsletterError::MalformedRequest(rejection.body_text()))
    }) {
        Ok(id) => id,
        Err(err) => return error_response(err, DATABASE_ERROR),
    };
    match service.unsubscribe(&context, id).await {
        Ok(()) => {
            let payload = json!({
                "success": true,
                "message": "Subscriber deleted successfully",
                "id": id,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err, DATABASE_ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::{StaticTokenGate, StoreError};
    use crate::newsletter::Subscriber;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    const TOKEN: &str = "newsletter-admin";

    struct OfflineSubscribers;

    #[async_trait]
    impl SubscriberStore for OfflineSubscribers {
        async fn create_subscriber(
            &self,
            _subscriber: NewSubscriber,
        ) -> Result<Subscriber, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }

        async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }

        async fn delete_subscriber(&self, _id: i64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }

        async fn subscriber_count(&self) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }
    }

    fn router<S: SubscriberStore + 'static>(store: S) -> Router {
        newsletter_router(Arc::new(NewsletterService::new(
            Arc::new(store),
            Arc::new(StaticTokenGate::new(Some(TOKEN.to_string()))),
        )))
    }

    fn request(method: Method, uri: &str, admin: bool, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if admin {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn read_json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn mistyped_signup_is_a_json_400() {
        let response = router(InMemoryStore::new())
            .oneshot(request(
                Method::POST,
                "/api/newsletter/subscribe",
                false,
                Some(json!({ "firstName": 7, "lastName": "Lynn", "email": "l@example.com" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(read_json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn anonymous_delete_with_bad_id_is_401() {
        let response = router(InMemoryStore::new())
            .oneshot(request(
                Method::DELETE,
                "/api/admin/newsletter-subscribers/abc",
                false,
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn storage_failures_use_endpoint_specific_messages() {
        let app = router(OfflineSubscribers);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/newsletter/subscribe",
                false,
                Some(json!({ "firstName": "Loretta", "lastName": "Lynn", "email": "l@example.com" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json_body(response).await["error"],
            json!("Failed to subscribe to newsletter")
        );

        for (method, uri) in [
            (Method::GET, "/api/admin/newsletter-subscribers"),
            (Method::DELETE, "/api/admin/newsletter-subscribers/3"),
        ] {
            let response = app
                .clone()
                .oneshot(request(method, uri, true, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(read_json_body(response).await["error"], json!("Database error"));
        }
    }
}
