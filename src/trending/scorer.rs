//! Trend score calculation.
//!
//! A video's score is its view velocity scaled by three multipliers:
//!
//! ```text
//! trend_score = views_per_hour × recency_boost × engagement_boost × authority_boost
//! engagement_boost = 1 + engagement_rate × engagement_multiplier
//! authority_boost  = 1 + authority_weight × ln(1 + subscriber_ratio)
//! ```
//!
//! Every constant lives in [`ScoringConfig`], so tuning the formula is a
//! configuration change. The score is a ranking heuristic, not a statistical model.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{EnrichedVideo, ScoredVideo, TrendTier};
use crate::error::{Result, TrendError};

/// Videos at most `max_hours` old get `boost`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyTier {
    pub max_hours: f64,
    pub boost: f64,
}

/// Both bars must be met to reach `tier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub tier: TrendTier,
    pub min_views_per_hour: f64,
    pub min_engagement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Floor for `hours_since_upload`, keeps velocity bounded for brand new uploads.
    pub min_age_hours: f64,
    pub engagement_multiplier: f64,
    /// 0 disables the channel authority factor.
    pub authority_weight: f64,
    /// Ascending by `max_hours`.
    pub recency_tiers: Vec<RecencyTier>,
    /// Boost for anything older than the last recency tier.
    pub stale_boost: f64,
    /// Descending severity; first match wins, no match means [`TrendTier::Normal`].
    pub tier_thresholds: Vec<TierThreshold>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_age_hours: 1.0,
            engagement_multiplier: 5.0,
            authority_weight: 0.1,
            recency_tiers: vec![
                RecencyTier { max_hours: 6.0, boost: 2.2 },
                RecencyTier { max_hours: 24.0, boost: 1.8 },
                RecencyTier { max_hours: 72.0, boost: 1.4 },
            ],
            stale_boost: 1.1,
            tier_thresholds: vec![
                TierThreshold {
                    tier: TrendTier::Exploding,
                    min_views_per_hour: 10_000.0,
                    min_engagement_rate: 0.04,
                },
                TierThreshold {
                    tier: TrendTier::Hot,
                    min_views_per_hour: 2_000.0,
                    min_engagement_rate: 0.02,
                },
                TierThreshold {
                    tier: TrendTier::Rising,
                    min_views_per_hour: 500.0,
                    min_engagement_rate: 0.01,
                },
            ],
        }
    }
}

impl ScoringConfig {
    /// Rejects constants that would break the scoring guarantees.
    ///
    /// # Validation Rules
    ///
    /// - All constants finite and non-negative, `min_age_hours` strictly positive
    /// - Recency tiers ascending by age with non-increasing boosts, none below `stale_boost`
    /// - Tier thresholds in strictly descending severity, never naming `Normal`
    pub fn validate(&self) -> Result<()> {
        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(TrendError::Config(format!(
                    "{name} must be a finite non-negative number, got: {value}"
                )))
            }
        };

        if !(self.min_age_hours.is_finite() && self.min_age_hours > 0.0) {
            return Err(TrendError::Config(format!(
                "min_age_hours must be greater than 0, got: {}",
                self.min_age_hours
            )));
        }
        non_negative("engagement_multiplier", self.engagement_multiplier)?;
        non_negative("authority_weight", self.authority_weight)?;
        non_negative("stale_boost", self.stale_boost)?;

        let mut previous: Option<RecencyTier> = None;
        for tier in &self.recency_tiers {
            non_negative("recency tier max_hours", tier.max_hours)?;
            non_negative("recency tier boost", tier.boost)?;
            if tier.boost < self.stale_boost {
                return Err(TrendError::Config(format!(
                    "recency boost {} is below the stale boost {}",
                    tier.boost, self.stale_boost
                )));
            }
            if let Some(prev) = previous {
                if tier.max_hours <= prev.max_hours || tier.boost > prev.boost {
                    return Err(TrendError::Config(
                        "recency tiers must be ascending by age with non-increasing boosts"
                            .to_string(),
                    ));
                }
            }
            previous = Some(*tier);
        }

        let mut last_tier: Option<TrendTier> = None;
        for threshold in &self.tier_thresholds {
            non_negative("tier min_views_per_hour", threshold.min_views_per_hour)?;
            non_negative("tier min_engagement_rate", threshold.min_engagement_rate)?;
            if threshold.tier == TrendTier::Normal {
                return Err(TrendError::Config(
                    "normal is the fallback tier and takes no threshold".to_string(),
                ));
            }
            if last_tier.is_some_and(|last| threshold.tier >= last) {
                return Err(TrendError::Config(
                    "tier thresholds must be listed from most to least severe".to_string(),
                ));
            }
            last_tier = Some(threshold.tier);
        }

        Ok(())
    }

    /// Step multiplier that never increases with age.
    pub fn recency_boost(&self, hours_since_upload: f64) -> f64 {
        self.recency_tiers
            .iter()
            .find(|tier| hours_since_upload <= tier.max_hours)
            .map_or(self.stale_boost, |tier| tier.boost)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrendScorer {
    config: ScoringConfig,
}

impl TrendScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Derives the signals for one video. Finite and non-negative for any counters.
    pub fn score(&self, video: EnrichedVideo) -> ScoredVideo {
        let hours = video.hours_since_upload.max(self.config.min_age_hours);
        let views = video.views as f64;

        let views_per_hour = views / hours;
        let engagement_rate = if video.views == 0 {
            0.0
        } else {
            video.likes.saturating_add(video.comments) as f64 / views
        };
        let subscriber_ratio = if video.subscribers == 0 {
            0.0
        } else {
            views / video.subscribers as f64
        };

        let recency_boost = self.config.recency_boost(hours);
        let engagement_boost = 1.0 + engagement_rate * self.config.engagement_multiplier;
        let authority_boost = 1.0 + self.config.authority_weight * subscriber_ratio.ln_1p();

        let raw = views_per_hour * recency_boost * engagement_boost * authority_boost;
        let trend_score = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        let trend_tier = self.classify(views_per_hour, engagement_rate);

        debug!(
            video_id = %video.video_id,
            views_per_hour,
            engagement_rate,
            recency_boost,
            trend_score,
            tier = %trend_tier,
            "scored video"
        );

        ScoredVideo {
            video,
            views_per_hour,
            engagement_rate,
            subscriber_ratio,
            trend_score,
            trend_tier,
        }
    }

    fn classify(&self, views_per_hour: f64, engagement_rate: f64) -> TrendTier {
        self.config
            .tier_thresholds
            .iter()
            .find(|t| {
                views_per_hour >= t.min_views_per_hour && engagement_rate >= t.min_engagement_rate
            })
            .map_or(TrendTier::Normal, |t| t.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn video(views: u64, likes: u64, comments: u64, hours: f64) -> EnrichedVideo {
        EnrichedVideo {
            video_id: "vid".to_string(),
            title: "title".to_string(),
            channel: "channel".to_string(),
            channel_id: "chan".to_string(),
            thumbnail_url: None,
            published_at: Utc::now(),
            views,
            likes,
            comments,
            subscribers: 0,
            hours_since_upload: hours,
            duration: 30,
        }
    }

    #[test]
    fn test_zero_views_scores_zero_without_nan() {
        let scorer = TrendScorer::default();
        let scored = scorer.score(video(0, 0, 0, 3.0));

        assert_eq!(scored.engagement_rate, 0.0);
        assert_eq!(scored.views_per_hour, 0.0);
        assert!(scored.trend_score.is_finite());
        assert_eq!(scored.trend_score, 0.0);
        assert_eq!(scored.trend_tier, TrendTier::Normal);
    }

    #[test]
    fn test_zero_views_with_stray_likes_keeps_zero_engagement() {
        let scored = TrendScorer::default().score(video(0, 12, 4, 0.0));
        assert_eq!(scored.engagement_rate, 0.0);
        assert!(scored.trend_score.is_finite());
    }

    #[test]
    fn test_brand_new_upload_uses_min_age_floor() {
        let scored = TrendScorer::default().score(video(600, 0, 0, 0.0));
        assert_eq!(scored.views_per_hour, 600.0);
    }

    #[test]
    fn test_recency_boost_never_increases_with_age() {
        let config = ScoringConfig::default();
        let ages = [5.0, 6.0, 6.01, 24.0, 72.0, 200.0];
        let boosts: Vec<f64> = ages.iter().map(|h| config.recency_boost(*h)).collect();

        for pair in boosts.windows(2) {
            assert!(pair[0] >= pair[1], "boosts not monotonic: {boosts:?}");
        }
        assert_eq!(boosts, vec![2.2, 2.2, 1.8, 1.8, 1.4, 1.1]);
    }

    #[test]
    fn test_engagement_raises_score_at_equal_velocity() {
        let scorer = TrendScorer::default();
        let quiet = scorer.score(video(10_000, 10, 0, 5.0));
        let loud = scorer.score(video(10_000, 800, 200, 5.0));

        assert_eq!(quiet.views_per_hour, loud.views_per_hour);
        assert!(loud.trend_score > quiet.trend_score);
        assert!((loud.engagement_rate - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_subscriber_ratio_only_with_subscriber_data() {
        let scorer = TrendScorer::default();
        let without = scorer.score(video(5_000, 0, 0, 10.0));
        assert_eq!(without.subscriber_ratio, 0.0);

        let mut with_subs = video(5_000, 0, 0, 10.0);
        with_subs.subscribers = 1_000;
        let with = scorer.score(with_subs);
        assert_eq!(with.subscriber_ratio, 5.0);
        assert!(with.trend_score > without.trend_score);
    }

    #[test]
    fn test_tier_requires_both_velocity_and_engagement() {
        let scorer = TrendScorer::default();

        // 50k views/hour but almost no engagement
        let viral_but_flat = scorer.score(video(100_000, 10, 0, 2.0));
        assert_eq!(viral_but_flat.trend_tier, TrendTier::Normal);

        let exploding = scorer.score(video(100_000, 5_000, 200, 2.0));
        assert_eq!(exploding.trend_tier, TrendTier::Exploding);

        let hot = scorer.score(video(30_000, 900, 0, 10.0));
        assert_eq!(hot.trend_tier, TrendTier::Hot);

        let rising = scorer.score(video(6_000, 100, 0, 10.0));
        assert_eq!(rising.trend_tier, TrendTier::Rising);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_increasing_recency_boost() {
        let mut config = ScoringConfig::default();
        config.recency_tiers[1].boost = 3.0;
        assert!(matches!(config.validate(), Err(TrendError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unordered_tiers() {
        let mut config = ScoringConfig::default();
        config.tier_thresholds.swap(0, 2);
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.min_age_hours = 0.0;
        assert!(config.validate().is_err());
    }
}
