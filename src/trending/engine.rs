use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::joiner::{merge, unique_channel_ids, unique_video_ids};
use super::models::{ScoredVideo, TrendPage, TrendQuery};
use super::scorer::TrendScorer;
use super::selector::{select, SelectionFilter};
use crate::cache::{CacheKey, TrendCache};
use crate::error::{Result, TrendError, UpstreamStage};
use crate::sources::{SearchRequest, VideoPlatform};

/// Upper bound of the platform's `maxResults`.
pub const MAX_SEARCH_RESULTS: u32 = 50;

/// Widest search window accepted, ten years in hours.
pub const MAX_PUBLISHED_WITHIN_HOURS: u32 = 24 * 365 * 10;

/// Where a query is in the pipeline, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Idle,
    CacheCheck,
    Searching,
    FetchingVideoStats,
    FetchingChannelStats,
    Joining,
    Scoring,
    Filtering,
    Caching,
    Done,
    Failed,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub search_order: String,
    pub video_duration: Option<String>,
    /// Applied to each upstream call on top of the HTTP client's own timeout.
    pub upstream_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            search_order: "date".to_string(),
            video_duration: Some("short".to_string()),
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub page: TrendPage,
    pub cached: bool,
}

/// Runs trend queries: cache, three upstream stages, join, score, select.
///
/// The cache is the only state shared between concurrent queries and is
/// never held across an upstream call. Only a fully completed pipeline
/// writes to it.
pub struct TrendEngine {
    platform: Arc<dyn VideoPlatform>,
    cache: TrendCache,
    scorer: TrendScorer,
    settings: EngineSettings,
}

impl TrendEngine {
    pub fn new(
        platform: Arc<dyn VideoPlatform>,
        cache: TrendCache,
        scorer: TrendScorer,
        settings: EngineSettings,
    ) -> Self {
        info!(
            "📈 Trend engine ready ({}), cache TTL {}",
            platform.source_name(),
            humantime::format_duration(cache.ttl())
        );
        Self {
            platform,
            cache,
            scorer,
            settings,
        }
    }

    pub fn cache(&self) -> &TrendCache {
        &self.cache
    }

    pub async fn query(&self, query: &TrendQuery) -> Result<QueryOutcome> {
        let key = CacheKey::from(query);
        trace_stage(&key, QueryStage::Idle);
        if let Err(e) = validate_query(query) {
            trace_stage(&key, QueryStage::Failed);
            return Err(e);
        }

        trace_stage(&key, QueryStage::CacheCheck);
        if let Some(page) = self.cache.get(&key) {
            info!(query = %key, "✅ Cache hit");
            return Ok(QueryOutcome { page, cached: true });
        }
        debug!(query = %key, "Cache miss");

        let page = match self.run_pipeline(query, &key).await {
            Ok(page) => page,
            Err(e) => {
                trace_stage(&key, QueryStage::Failed);
                warn!(query = %key, error = %e, "❌ Trend query failed");
                return Err(e);
            }
        };

        trace_stage(&key, QueryStage::Caching);
        if !self.cache.put_if_absent(key.clone(), page.clone()) {
            debug!(query = %key, "Another query cached this key first");
        }

        trace_stage(&key, QueryStage::Done);
        info!(
            query = %key,
            items = page.items.len(),
            total = page.total_results,
            "🎯 Trend query completed"
        );
        Ok(QueryOutcome { page, cached: false })
    }

    async fn run_pipeline(&self, query: &TrendQuery, key: &CacheKey) -> Result<TrendPage> {
        let now = Utc::now();

        trace_stage(key, QueryStage::Searching);
        let request = SearchRequest {
            query: query.query.clone(),
            region: query.region.clone(),
            max_results: query.max_results,
            order: self.settings.search_order.clone(),
            published_after: query
                .published_within_hours
                .map(|hours| search_window_start(now, hours))
                .transpose()?,
            video_duration: self.settings.video_duration.clone(),
        };
        let searches = self
            .upstream(UpstreamStage::Search, self.platform.search(&request))
            .await?;
        if searches.is_empty() {
            info!(query = %key, "🔍 No videos found");
            return Ok(TrendPage::empty(query.page, query.page_size));
        }

        trace_stage(key, QueryStage::FetchingVideoStats);
        let video_ids = unique_video_ids(&searches);
        let video_stats = self
            .upstream(
                UpstreamStage::VideoStats,
                self.platform.fetch_video_stats(&video_ids),
            )
            .await?;

        trace_stage(key, QueryStage::FetchingChannelStats);
        let channel_ids = unique_channel_ids(&searches, &video_stats);
        let channel_stats = self
            .upstream(
                UpstreamStage::ChannelStats,
                self.platform.fetch_channel_stats(&channel_ids),
            )
            .await?;

        trace_stage(key, QueryStage::Joining);
        let enriched = merge(
            searches,
            &video_stats,
            &channel_stats,
            now,
            self.scorer.config().min_age_hours,
        );

        trace_stage(key, QueryStage::Scoring);
        let scored: Vec<ScoredVideo> = enriched
            .into_iter()
            .map(|video| self.scorer.score(video))
            .collect();

        trace_stage(key, QueryStage::Filtering);
        let filter = SelectionFilter {
            min_views: query.min_views,
            min_subscribers: query.min_subscribers,
        };
        select(scored, filter, query.page_size, query.page)
    }

    async fn upstream<T>(
        &self,
        stage: UpstreamStage,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let limit = self.settings.upstream_timeout;
        match timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(TrendError::timeout(
                stage,
                format!("no response within {}", humantime::format_duration(limit)),
            )),
        }
    }
}

fn search_window_start(now: DateTime<Utc>, hours: u32) -> Result<DateTime<Utc>> {
    now.checked_sub_signed(chrono::Duration::hours(i64::from(hours)))
        .ok_or_else(|| {
            TrendError::Validation(format!("published within {hours} hours is out of range"))
        })
}

fn trace_stage(key: &CacheKey, stage: QueryStage) {
    debug!(query = %key, %stage, "stage");
}

/// Rejects a query before any upstream call is made.
pub fn validate_query(query: &TrendQuery) -> Result<()> {
    if query.query.trim().is_empty() {
        return Err(TrendError::Validation("query text must not be empty".to_string()));
    }
    if query.region.len() != 2 || !query.region.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(TrendError::Validation(format!(
            "region must be a two-letter country code, got: {:?}",
            query.region
        )));
    }
    if query.max_results == 0 || query.max_results > MAX_SEARCH_RESULTS {
        return Err(TrendError::Validation(format!(
            "max results must be between 1 and {MAX_SEARCH_RESULTS}, got: {}",
            query.max_results
        )));
    }
    if query.page < 1 {
        return Err(TrendError::Validation("page must be 1 or greater".to_string()));
    }
    if query.page_size == 0 {
        return Err(TrendError::Validation("page size must be greater than 0".to_string()));
    }
    if let Some(hours) = query.published_within_hours {
        if hours == 0 || hours > MAX_PUBLISHED_WITHIN_HOURS {
            return Err(TrendError::Validation(format!(
                "published within hours must be between 1 and {MAX_PUBLISHED_WITHIN_HOURS}, got: {hours}"
            )));
        }
    }
    Ok(())
}
