pub mod config;
pub mod error;
pub mod moderation;
pub mod newsletter;
pub mod store;
pub mod telemetry;
