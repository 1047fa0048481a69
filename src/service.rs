//! Operations exposed to callers: explore, health and cache status.
//!
//! These are transport-agnostic; an HTTP layer or the bundled CLI maps its
//! own request format onto [`ExploreParams`] and serializes the results.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::cache::TrendCache;
use crate::config::{Config, QueryDefaults};
use crate::error::{ErrorResponse, Result};
use crate::sources::{VideoPlatform, YouTubeApiV3Client};
use crate::trending::{TrendEngine, TrendPage, TrendQuery, TrendScorer};

/// Raw, optional request parameters as a caller supplies them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreParams {
    #[serde(alias = "q")]
    pub query: Option<String>,
    pub region: Option<String>,
    pub max_results: Option<u32>,
    pub min_subscribers: Option<u64>,
    pub min_views: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub published_within_hours: Option<u32>,
}

impl ExploreParams {
    /// Fills gaps from `defaults` and normalizes text fields.
    pub fn into_query(self, defaults: &QueryDefaults) -> TrendQuery {
        let query = self
            .query
            .map(|q| q.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| defaults.query.clone());
        let region = self
            .region
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| defaults.region.clone());

        TrendQuery {
            query,
            region,
            max_results: self.max_results.unwrap_or(defaults.max_results),
            min_subscribers: self.min_subscribers.unwrap_or(defaults.min_subscribers),
            min_views: self.min_views.unwrap_or(defaults.min_views),
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            published_within_hours: self.published_within_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreResponse {
    pub query: TrendQuery,
    pub cached: bool,
    #[serde(flatten)]
    pub page: TrendPage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub cached_keys: usize,
    pub hits: u64,
    pub misses: u64,
    pub uptime_secs: u64,
}

pub struct TrendService {
    engine: TrendEngine,
    defaults: QueryDefaults,
    port: u16,
    started_at: Instant,
}

impl TrendService {
    pub fn new(engine: TrendEngine, defaults: QueryDefaults, port: u16) -> Self {
        Self {
            engine,
            defaults,
            port,
            started_at: Instant::now(),
        }
    }

    /// Wires the YouTube client, a fresh cache and the scorer from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = YouTubeApiV3Client::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            config.upstream_timeout,
        )?;
        Ok(Self::with_platform(config, Arc::new(client)))
    }

    pub fn with_platform(config: &Config, platform: Arc<dyn VideoPlatform>) -> Self {
        let engine = TrendEngine::new(
            platform,
            TrendCache::new(config.cache_ttl),
            TrendScorer::new(config.scoring.clone()),
            config.engine_settings(),
        );
        Self::new(engine, config.defaults.clone(), config.port)
    }

    pub async fn explore(
        &self,
        params: ExploreParams,
    ) -> std::result::Result<ExploreResponse, ErrorResponse> {
        let query = params.into_query(&self.defaults);
        match self.engine.query(&query).await {
            Ok(outcome) => Ok(ExploreResponse {
                query,
                cached: outcome.cached,
                page: outcome.page,
            }),
            Err(e) => Err(ErrorResponse::from(e)),
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            port: self.port,
        }
    }

    pub fn cache_status(&self) -> CacheStatus {
        let metrics = self.engine.cache().metrics();
        let status = CacheStatus {
            cached_keys: metrics.entries,
            hits: metrics.hits,
            misses: metrics.misses,
            uptime_secs: self.started_at.elapsed().as_secs(),
        };
        info!(
            "🗄️ Cache: {} keys, hit rate {:.0}%, up {}",
            status.cached_keys,
            metrics.hit_rate() * 100.0,
            humantime::format_duration(std::time::Duration::from_secs(status.uptime_secs))
        );
        status
    }
}
