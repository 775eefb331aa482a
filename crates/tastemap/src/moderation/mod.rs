//! Moderation of restaurant submissions and reviews.
//!
//! Records enter as `pending`; administrators move them between `pending`,
//! `approved` and `rejected` or delete them. Only `approved` records reach the
//! public catalogue.

pub mod domain;
pub mod gate;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    DashboardStats, NewRestaurant, NewReview, PhotoDescriptor, PublicRestaurant, PublicReview,
    RestaurantSubmission, Review, StatusCounts, StatusFilter, SubmissionId, SubmissionKind,
    SubmissionStatus, UnknownStatus,
};
pub use gate::{AdminGate, RequestContext, StaticTokenGate};
pub use repository::{StoreError, SubmissionStore};
pub use router::{moderation_router, stats_router};
pub use service::{ModerationError, ModerationService};
pub use validation::ValidationError;
