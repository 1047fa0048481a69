//! Trend scoring and aggregation.
//!
//! [`engine::TrendEngine`] drives one query through the pipeline:
//! cache check, search, video statistics, channel statistics,
//! [`joiner::merge`], [`scorer::TrendScorer`], [`selector::select`], cache fill.

pub mod engine;
pub mod joiner;
pub mod models;
pub mod scorer;
pub mod selector;

pub use engine::{EngineSettings, QueryOutcome, TrendEngine};
pub use models::{EnrichedVideo, ScoredVideo, TrendPage, TrendQuery, TrendTier};
pub use scorer::{ScoringConfig, TrendScorer};
