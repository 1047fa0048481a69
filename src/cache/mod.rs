//! # Cache Module
//!
//! Result cache for the trend engine.
//!
//! Every distinct query is expensive: one search plus two bulk lookups against
//! a quota-limited API. The cache stores the final, already paginated
//! [`TrendPage`] for a normalized query signature so repeated requests within
//! the TTL window cost nothing upstream.
//!
//! ## Features
//!
//! - **Fixed TTL**: one time-to-live for every entry, configured at startup
//! - **Lazy Expiry**: an expired entry is deleted by the first read that finds it
//! - **Thread Safety**: concurrent reads and writes from many in-flight queries
//! - **Metrics**: hit/miss counters and the number of stored keys
//!
//! ## Configuration
//!
//! ```env
//! CACHE_TTL_SECS=600          # Time-to-live in seconds (10 minutes)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trend_radar::cache::{CacheKey, TrendCache};
//! use trend_radar::trending::models::{TrendPage, TrendQuery};
//! use std::time::Duration;
//!
//! # fn example(query: &TrendQuery) {
//! let cache = TrendCache::new(Duration::from_secs(600));
//! let key = CacheKey::from(query);
//!
//! cache.put(key.clone(), TrendPage::empty(query.page, query.page_size));
//!
//! if let Some(page) = cache.get(&key) {
//!     println!("cached page with {} videos", page.items.len());
//! }
//! # }
//! ```

pub mod ttl_cache;

use std::fmt;

use crate::trending::models::{TrendPage, TrendQuery};

pub use ttl_cache::{CacheMetrics, TtlCache};

/// Cache of finished result pages keyed by query signature.
pub type TrendCache = TtlCache<CacheKey, TrendPage>;

/// Normalized signature of a [`TrendQuery`].
///
/// A structured key: each parameter occupies its own field, so neither
/// parameter order nor separator characters inside the query text can make
/// two different queries collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    region: String,
    max_results: u32,
    min_subscribers: u64,
    min_views: u64,
    page: u32,
    page_size: u32,
    published_within_hours: Option<u32>,
}

impl From<&TrendQuery> for CacheKey {
    fn from(query: &TrendQuery) -> Self {
        Self {
            query: normalize_query_text(&query.query),
            region: query.region.trim().to_ascii_uppercase(),
            max_results: query.max_results,
            min_subscribers: query.min_subscribers,
            min_views: query.min_views,
            page: query.page,
            page_size: query.page_size,
            published_within_hours: query.published_within_hours,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q={:?}|region={}|max={}|min_subs={}|min_views={}|page={}|size={}",
            self.query,
            self.region,
            self.max_results,
            self.min_subscribers,
            self.min_views,
            self.page,
            self.page_size
        )?;
        if let Some(hours) = self.published_within_hours {
            write!(f, "|within={hours}h")?;
        }
        Ok(())
    }
}

/// Lowercases and collapses whitespace.
pub fn normalize_query_text(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
