use crate::config::ConfigError;
use crate::moderation::{ModerationError, StoreError};
use crate::newsletter::NewsletterError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Storage(StoreError),
    Moderation(ModerationError),
    Newsletter(NewsletterError),
    Serialization(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Moderation(err) => write!(f, "moderation error: {}", err),
            AppError::Newsletter(err) => write!(f, "newsletter error: {}", err),
            AppError::Serialization(err) => write!(f, "serialization error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Moderation(err) => Some(err),
            AppError::Newsletter(err) => Some(err),
            AppError::Serialization(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Storage(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Storage(StoreError::Conflict)
            | AppError::Moderation(ModerationError::Conflict) => StatusCode::CONFLICT,
            AppError::Moderation(ModerationError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Moderation(ModerationError::Unauthorized) => StatusCode::UNAUTHORIZED,
            AppError::Moderation(ModerationError::Validation(_))
            | AppError::Newsletter(NewsletterError::MissingFields(_))
            | AppError::Newsletter(NewsletterError::MalformedRequest(_))
            | AppError::Newsletter(NewsletterError::InvalidEmail(_)) => StatusCode::BAD_REQUEST,
            AppError::Newsletter(NewsletterError::AlreadySubscribed) => StatusCode::CONFLICT,
            AppError::Newsletter(NewsletterError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Newsletter(NewsletterError::Unauthorized) => StatusCode::UNAUTHORIZED,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Storage(StoreError::Unavailable(_))
            | AppError::Moderation(ModerationError::Storage(_))
            | AppError::Newsletter(NewsletterError::Storage(_))
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<ModerationError> for AppError {
    fn from(value: ModerationError) -> Self {
        Self::Moderation(value)
    }
}

impl From<NewsletterError> for AppError {
    fn from(value: NewsletterError) -> Self {
        Self::Newsletter(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::{SubmissionId, SubmissionKind};

    #[test]
    fn moderation_errors_keep_their_status_codes() {
        let not_found = AppError::from(ModerationError::NotFound {
            kind: SubmissionKind::Review,
            id: SubmissionId(3),
        });
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let unauthorized = AppError::from(ModerationError::Unauthorized);
        assert_eq!(
            unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn storage_failures_are_internal_errors() {
        let err = AppError::from(StoreError::Unavailable("disk full".to_string()));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
