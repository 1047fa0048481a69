use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::{Result, TrendError};
use crate::trending::engine::{EngineSettings, MAX_SEARCH_RESULTS};
use crate::trending::scorer::{RecencyTier, ScoringConfig};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Parameters used when a request leaves them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefaults {
    pub query: String,
    pub region: String,
    pub max_results: u32,
    pub page_size: u32,
    pub min_subscribers: u64,
    pub min_views: u64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            query: "trending".to_string(),
            region: "US".to_string(),
            max_results: 25,
            page_size: 10,
            min_subscribers: 0,
            min_views: 0,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    // YouTube
    pub api_key: String,
    pub api_base_url: Url,
    pub upstream_timeout: Duration,
    pub search_order: String,
    /// `None` when `SEARCH_VIDEO_DURATION=any`.
    pub video_duration: Option<String>,

    // Cache
    pub cache_ttl: Duration,

    // Consultas
    pub defaults: QueryDefaults,
    pub scoring: ScoringConfig,

    // Servicio
    pub port: u16,
}

impl Config {
    /// Loads `.env` and then reads the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("YOUTUBE_API_KEY")
            .ok_or_else(|| TrendError::Config("YOUTUBE_API_KEY must be set".to_string()))?;

        let api_base_url = var("YOUTUBE_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&api_base_url).map_err(|e| {
            TrendError::Config(format!("YOUTUBE_API_BASE_URL is not a valid URL: {e}"))
        })?;

        let video_duration = match var("SEARCH_VIDEO_DURATION").as_deref() {
            None => Some("short".to_string()),
            Some("any") => None,
            Some(duration @ ("short" | "medium" | "long")) => Some(duration.to_string()),
            Some(other) => {
                return Err(TrendError::Config(format!(
                    "SEARCH_VIDEO_DURATION must be any, short, medium or long, got: {other}"
                )))
            }
        };

        let base = ScoringConfig::default();
        let recency_tiers = match var("RECENCY_TIERS") {
            Some(raw) => parse_recency_tiers(&raw)?,
            None => base.recency_tiers.clone(),
        };
        let scoring = ScoringConfig {
            min_age_hours: parse_or(&var, "MIN_AGE_HOURS", base.min_age_hours)?,
            engagement_multiplier: parse_or(&var, "ENGAGEMENT_MULTIPLIER", base.engagement_multiplier)?,
            authority_weight: parse_or(&var, "AUTHORITY_WEIGHT", base.authority_weight)?,
            stale_boost: parse_or(&var, "RECENCY_STALE_BOOST", base.stale_boost)?,
            recency_tiers,
            tier_thresholds: base.tier_thresholds,
        };

        let fallback = QueryDefaults::default();
        let defaults = QueryDefaults {
            query: var("DEFAULT_QUERY").unwrap_or(fallback.query),
            region: var("DEFAULT_REGION")
                .map(|r| r.trim().to_ascii_uppercase())
                .unwrap_or(fallback.region),
            max_results: parse_or(&var, "DEFAULT_MAX_RESULTS", fallback.max_results)?,
            page_size: parse_or(&var, "DEFAULT_PAGE_SIZE", fallback.page_size)?,
            min_subscribers: parse_or(&var, "DEFAULT_MIN_SUBSCRIBERS", fallback.min_subscribers)?,
            min_views: parse_or(&var, "DEFAULT_MIN_VIEWS", fallback.min_views)?,
        };

        let config = Self {
            api_key,
            api_base_url,
            upstream_timeout: Duration::from_secs(parse_or(&var, "UPSTREAM_TIMEOUT_SECS", 10)?),
            search_order: var("SEARCH_ORDER").unwrap_or_else(|| "date".to_string()),
            video_duration,
            cache_ttl: Duration::from_secs(parse_or(&var, "CACHE_TTL_SECS", 600)?),
            defaults,
            scoring,
            port: parse_or(&var, "PORT", 3000)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Cache TTL and upstream timeout must be greater than 0
    /// - Default max results must be between 1 and 50 (API limit)
    /// - Default page size must be greater than 0
    /// - Default region must be a two-letter code
    /// - Scoring constants must pass [`ScoringConfig::validate`]
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl.is_zero() {
            return Err(TrendError::Config("CACHE_TTL_SECS must be greater than 0".to_string()));
        }

        if self.upstream_timeout.is_zero() {
            return Err(TrendError::Config(
                "UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.defaults.max_results == 0 || self.defaults.max_results > MAX_SEARCH_RESULTS {
            return Err(TrendError::Config(format!(
                "DEFAULT_MAX_RESULTS must be between 1 and {MAX_SEARCH_RESULTS}, got: {}",
                self.defaults.max_results
            )));
        }

        if self.defaults.page_size == 0 {
            return Err(TrendError::Config("DEFAULT_PAGE_SIZE must be greater than 0".to_string()));
        }

        if self.defaults.region.len() != 2
            || !self.defaults.region.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(TrendError::Config(format!(
                "DEFAULT_REGION must be a two-letter country code, got: {}",
                self.defaults.region
            )));
        }

        self.scoring.validate()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            search_order: self.search_order.clone(),
            video_duration: self.video_duration.clone(),
            upstream_timeout: self.upstream_timeout,
        }
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The API key is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            YouTube: {} (timeout {}, order {}, duration {})\n  \
            Cache: TTL {}\n  \
            Defaults: q={:?}, region {}, {} results, {} per page, min {} subs / {} views\n  \
            Scoring: engagement x{}, authority {}, min age {}h\n  \
            Port: {}",
            self.api_base_url,
            humantime::format_duration(self.upstream_timeout),
            self.search_order,
            self.video_duration.as_deref().unwrap_or("any"),
            humantime::format_duration(self.cache_ttl),
            self.defaults.query,
            self.defaults.region,
            self.defaults.max_results,
            self.defaults.page_size,
            self.defaults.min_subscribers,
            self.defaults.min_views,
            self.scoring.engagement_multiplier,
            self.scoring.authority_weight,
            self.scoring.min_age_hours,
            self.port
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("upstream_timeout", &self.upstream_timeout)
            .field("search_order", &self.search_order)
            .field("video_duration", &self.video_duration)
            .field("cache_ttl", &self.cache_ttl)
            .field("defaults", &self.defaults)
            .field("scoring", &self.scoring)
            .field("port", &self.port)
            .finish()
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| TrendError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
        None => Ok(default),
    }
}

/// Parses `6:2.2,24:1.8,72:1.4` into recency tiers.
fn parse_recency_tiers(raw: &str) -> Result<Vec<RecencyTier>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let invalid = || {
                TrendError::Config(format!(
                    "RECENCY_TIERS entry {part:?} must look like <max_hours>:<boost>"
                ))
            };
            let (hours, boost) = part.split_once(':').ok_or_else(invalid)?;
            Ok(RecencyTier {
                max_hours: hours.trim().parse().map_err(|_| invalid())?,
                boost: boost.trim().parse().map_err(|_| invalid())?,
            })
        })
        .collect()
}
