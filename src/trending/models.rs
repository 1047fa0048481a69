use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One search hit joined with its statistics and channel audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedVideo {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub channel_id: String,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// 0 when the channel hides its count or was not returned.
    pub subscribers: u64,
    /// Computed against the query's single `now`, floored at the configured minimum age.
    pub hours_since_upload: f64,
    /// Seconds.
    pub duration: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendTier {
    Normal,
    Rising,
    Hot,
    Exploding,
}

impl fmt::Display for TrendTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendTier::Normal => "normal",
            TrendTier::Rising => "rising",
            TrendTier::Hot => "hot",
            TrendTier::Exploding => "exploding",
        };
        f.write_str(label)
    }
}

/// An [`EnrichedVideo`] with its derived signals. Never edited after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredVideo {
    #[serde(flatten)]
    pub video: EnrichedVideo,
    pub views_per_hour: f64,
    pub engagement_rate: f64,
    pub subscriber_ratio: f64,
    pub trend_score: f64,
    pub trend_tier: TrendTier,
}

/// Normalized parameters of one trend query. Every field is part of the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendQuery {
    pub query: String,
    pub region: String,
    pub max_results: u32,
    pub min_subscribers: u64,
    pub min_views: u64,
    /// 1-indexed.
    pub page: u32,
    pub page_size: u32,
    pub published_within_hours: Option<u32>,
}

/// One page of ranked videos, exactly as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPage {
    pub items: Vec<ScoredVideo>,
    pub page: u32,
    pub page_size: u32,
    /// Records that passed the filters, across all pages.
    pub total_results: usize,
    pub total_pages: usize,
}

impl TrendPage {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            page_size,
            total_results: 0,
            total_pages: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
