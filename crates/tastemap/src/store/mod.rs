//! Store implementations for [`SubmissionStore`](crate::moderation::SubmissionStore)
//! and [`SubscriberStore`](crate::newsletter::SubscriberStore).

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
