use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::models::EnrichedVideo;
use crate::sources::{RawChannelStats, RawSearchItem, RawVideoStats};

/// Joins the three upstream stages into one record per video.
///
/// Output follows the order of `searches`, one record per video id. A search hit with no statistics
/// (removed or private by the time stats were fetched) is dropped; a missing
/// channel defaults to zero subscribers. `now` is the single timestamp shared
/// by every record of the query.
pub fn merge(
    searches: Vec<RawSearchItem>,
    video_stats: &[RawVideoStats],
    channel_stats: &[RawChannelStats],
    now: DateTime<Utc>,
    min_age_hours: f64,
) -> Vec<EnrichedVideo> {
    let stats_by_video: HashMap<&str, &RawVideoStats> = video_stats
        .iter()
        .map(|stats| (stats.video_id.as_str(), stats))
        .collect();
    let subscribers_by_channel: HashMap<&str, u64> = channel_stats
        .iter()
        .map(|channel| (channel.channel_id.as_str(), channel.subscriber_count))
        .collect();

    let searched = searches.len();
    let mut seen = HashSet::new();
    let merged: Vec<EnrichedVideo> = searches
        .into_iter()
        .filter_map(|item| {
            if !seen.insert(item.video_id.clone()) {
                return None;
            }
            let Some(stats) = stats_by_video.get(item.video_id.as_str()) else {
                debug!(video_id = %item.video_id, "no statistics, dropping");
                return None;
            };
            let subscribers = subscribers_by_channel
                .get(item.channel_id.as_str())
                .copied()
                .unwrap_or(0);

            Some(EnrichedVideo {
                hours_since_upload: hours_between(item.published_at, now).max(min_age_hours),
                video_id: item.video_id,
                title: item.title,
                channel: item.channel_title,
                channel_id: item.channel_id,
                thumbnail_url: item.thumbnail_url,
                published_at: item.published_at,
                views: stats.view_count,
                likes: stats.like_count,
                comments: stats.comment_count,
                subscribers,
                duration: stats.duration,
            })
        })
        .collect();

    debug!(searched, merged = merged.len(), "joined upstream records");
    merged
}

/// Channel ids of the videos that survived the statistics stage, first-seen order, no repeats.
pub fn unique_channel_ids(searches: &[RawSearchItem], video_stats: &[RawVideoStats]) -> Vec<String> {
    let with_stats: HashSet<&str> =
        video_stats.iter().map(|s| s.video_id.as_str()).collect();
    let mut seen = HashSet::new();

    searches
        .iter()
        .filter(|item| with_stats.contains(item.video_id.as_str()))
        .filter(|item| seen.insert(item.channel_id.as_str()))
        .map(|item| item.channel_id.clone())
        .collect()
}

/// Video ids in search order, no repeats.
pub fn unique_video_ids(searches: &[RawSearchItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    searches
        .iter()
        .filter(|item| seen.insert(item.video_id.as_str()))
        .map(|item| item.video_id.clone())
        .collect()
}

// Clock skew can put `published_at` slightly ahead of `now`.
fn hours_between(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - published_at).num_milliseconds().max(0);
    millis as f64 / 3_600_000.0
}
