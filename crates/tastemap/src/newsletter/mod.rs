//! Newsletter sign-up with unique addresses and an admin subscriber list.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{NewSubscriber, Subscriber};
pub use repository::SubscriberStore;
pub use router::newsletter_router;
pub use service::{NewsletterError, NewsletterService};
