//! # Trend Radar
//!
//! Finds recently published short-form videos for a topic, enriches them with
//! engagement and channel signals, and ranks them by how fast they are
//! spreading compared to their peers.
//!
//! The entry point for callers is [`service::TrendService`]; the pipeline
//! itself lives in [`trending`].

pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod sources;
pub mod trending;

pub use config::Config;
pub use error::{ErrorResponse, TrendError};
pub use service::{ExploreParams, ExploreResponse, TrendService};
