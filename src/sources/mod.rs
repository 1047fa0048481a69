pub mod youtube_api_v3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use youtube_api_v3::YouTubeApiV3Client;

/// Parameters of the keyword search stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub region: String,
    pub max_results: u32,
    /// Platform sort order, e.g. `date` or `viewCount`.
    pub order: String,
    pub published_after: Option<DateTime<Utc>>,
    /// `short`, `medium`, `long`; `None` searches every length.
    pub video_duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSearchItem {
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVideoStats {
    pub video_id: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// Seconds.
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChannelStats {
    pub channel_id: String,
    /// 0 when the channel hides its subscriber count.
    pub subscriber_count: u64,
}

/// Read-only access to the video platform.
///
/// Every call spends API quota. Id lists must already be deduplicated by the
/// caller; an empty list returns an empty result without a network call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawSearchItem>>;

    async fn fetch_video_stats(&self, video_ids: &[String]) -> Result<Vec<RawVideoStats>>;

    async fn fetch_channel_stats(&self, channel_ids: &[String]) -> Result<Vec<RawChannelStats>>;

    fn source_name(&self) -> &'static str;
}
