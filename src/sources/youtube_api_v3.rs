use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use super::{RawChannelStats, RawSearchItem, RawVideoStats, SearchRequest, VideoPlatform};
use crate::error::{Result, TrendError, UpstreamStage};

/// Ids accepted per `videos`/`channels` request.
const MAX_IDS_PER_REQUEST: usize = 50;
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    title: String,
    channel_id: String,
    channel_title: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize, Clone)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    statistics: VideoStatistics,
    content_details: Option<ContentDetails>,
}

// Counters arrive as strings and are omitted when hidden.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    #[serde(default)]
    hidden_subscriber_count: bool,
}

/// Client for the YouTube Data API v3 `search`, `videos` and `channels` endpoints.
pub struct YouTubeApiV3Client {
    api_key: String,
    base_url: Url,
    client: reqwest::Client,
}

impl YouTubeApiV3Client {
    pub fn new(api_key: String, base_url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrendError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        stage: UpstreamStage,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.endpoint(path))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| request_error(stage, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let error_text = truncate(&error_text, MAX_ERROR_BODY);
            error!("❌ YouTube API {} error: {} - {}", stage, status, error_text);
            return Err(TrendError::upstream(stage, format!("{status} - {error_text}")));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                TrendError::upstream(stage, format!("malformed response: {}", e.without_url()))
            } else {
                request_error(stage, e)
            }
        })
    }

    async fn fetch_batched<T, R, F>(
        &self,
        stage: UpstreamStage,
        path: &str,
        part: &str,
        ids: &[String],
        convert: F,
    ) -> Result<Vec<R>>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Vec<R>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let requests = ids.chunks(MAX_IDS_PER_REQUEST).map(|chunk| {
            let params = [
                ("part", part.to_string()),
                ("id", chunk.join(",")),
                ("maxResults", MAX_IDS_PER_REQUEST.to_string()),
            ];
            async move { self.get_json::<T>(stage, path, &params).await }
        });

        let responses = try_join_all(requests).await?;
        Ok(responses.into_iter().flat_map(convert).collect())
    }
}

#[async_trait]
impl VideoPlatform for YouTubeApiV3Client {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawSearchItem>> {
        debug!("🔍 YouTube search: {} ({})", request.query, request.region);

        let mut params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", request.query.clone()),
            ("regionCode", request.region.clone()),
            ("maxResults", request.max_results.to_string()),
            ("order", request.order.clone()),
        ];
        if let Some(after) = request.published_after {
            params.push((
                "publishedAfter",
                after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        if let Some(duration) = &request.video_duration {
            params.push(("videoDuration", duration.clone()));
        }

        let response: SearchResponse = self.get_json(UpstreamStage::Search, "search", &params).await?;
        let items = search_items(response);

        info!("✅ YouTube search: {} results for '{}'", items.len(), request.query);
        Ok(items)
    }

    async fn fetch_video_stats(&self, video_ids: &[String]) -> Result<Vec<RawVideoStats>> {
        let stats = self
            .fetch_batched(
                UpstreamStage::VideoStats,
                "videos",
                "statistics,contentDetails",
                video_ids,
                video_stats,
            )
            .await?;
        debug!("📊 Video statistics: {}/{} returned", stats.len(), video_ids.len());
        Ok(stats)
    }

    async fn fetch_channel_stats(&self, channel_ids: &[String]) -> Result<Vec<RawChannelStats>> {
        let stats = self
            .fetch_batched(
                UpstreamStage::ChannelStats,
                "channels",
                "statistics",
                channel_ids,
                channel_stats,
            )
            .await?;
        debug!("📊 Channel statistics: {}/{} returned", stats.len(), channel_ids.len());
        Ok(stats)
    }

    fn source_name(&self) -> &'static str {
        "YouTube API v3"
    }
}

fn request_error(stage: UpstreamStage, err: reqwest::Error) -> TrendError {
    if err.is_timeout() {
        error!("⏰ YouTube API {} timed out", stage);
        TrendError::timeout(stage, "request timed out")
    } else {
        TrendError::upstream(stage, err.without_url().to_string())
    }
}

// Results without a video id (channels, playlists) are skipped.
fn search_items(response: SearchResponse) -> Vec<RawSearchItem> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let snippet = item.snippet;
            let thumbnails = snippet.thumbnails;
            let thumbnail_url = thumbnails
                .high
                .or(thumbnails.medium)
                .or(thumbnails.default)
                .map(|t| t.url);

            Some(RawSearchItem {
                video_id,
                title: decode_html_entities(&snippet.title),
                channel_id: snippet.channel_id,
                channel_title: decode_html_entities(&snippet.channel_title),
                published_at: snippet.published_at,
                thumbnail_url,
            })
        })
        .collect()
}

fn video_stats(response: VideoListResponse) -> Vec<RawVideoStats> {
    response
        .items
        .into_iter()
        .map(|item| RawVideoStats {
            video_id: item.id,
            view_count: parse_count(item.statistics.view_count.as_deref()),
            like_count: parse_count(item.statistics.like_count.as_deref()),
            comment_count: parse_count(item.statistics.comment_count.as_deref()),
            duration: item
                .content_details
                .map_or(0, |details| parse_duration(&details.duration)),
        })
        .collect()
}

fn channel_stats(response: ChannelListResponse) -> Vec<RawChannelStats> {
    response
        .items
        .into_iter()
        .map(|item| {
            let subscriber_count = if item.statistics.hidden_subscriber_count {
                0
            } else {
                parse_count(item.statistics.subscriber_count.as_deref())
            };
            RawChannelStats {
                channel_id: item.id,
                subscriber_count,
            }
        })
        .collect()
}

fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Parses an ISO 8601 duration (`PT1H2M3S`, `P1DT2H`) into seconds.
fn parse_duration(duration: &str) -> u64 {
    let mut total = 0u64;
    let mut current_num = String::new();

    for ch in duration.chars() {
        let unit = match ch {
            'P' | 'T' => continue,
            _ if ch.is_ascii_digit() => {
                current_num.push(ch);
                continue;
            }
            'D' => 86_400,
            'H' => 3_600,
            'M' => 60,
            'S' => 1,
            _ => {
                current_num.clear();
                continue;
            }
        };
        let value: u64 = current_num.parse().unwrap_or(0);
        total = total.saturating_add(value.saturating_mul(unit));
        current_num.clear();
    }

    total
}

fn decode_html_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("PT45S"), 45);
        assert_eq!(parse_duration("PT1M5S"), 65);
        assert_eq!(parse_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_duration("P1DT1S"), 86_401);
        assert_eq!(parse_duration("P0D"), 0);
        assert_eq!(parse_duration(""), 0);
    }

    #[test]
    fn test_search_items_skip_non_videos_and_pick_best_thumbnail() {
        let json = r#"{
            "items": [
                {
                    "id": {"kind": "youtube#video", "videoId": "abc123"},
                    "snippet": {
                        "title": "Tom &amp; Jerry&#39;s &quot;best&quot; moment",
                        "channelId": "UC1",
                        "channelTitle": "Cartoons",
                        "publishedAt": "2026-10-18T10:00:00Z",
                        "thumbnails": {
                            "default": {"url": "https://i.ytimg.com/default.jpg"},
                            "medium": {"url": "https://i.ytimg.com/medium.jpg"}
                        }
                    }
                },
                {
                    "id": {"kind": "youtube#channel", "channelId": "UC2"},
                    "snippet": {
                        "title": "A channel",
                        "channelId": "UC2",
                        "channelTitle": "A channel",
                        "publishedAt": "2026-10-18T10:00:00Z"
                    }
                }
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let items = search_items(response);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].video_id, "abc123");
        assert_eq!(items[0].title, "Tom & Jerry's \"best\" moment");
        assert_eq!(items[0].channel_id, "UC1");
        assert_eq!(
            items[0].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/medium.jpg")
        );
        assert_eq!(items[0].published_at.to_rfc3339(), "2026-10-18T10:00:00+00:00");
    }

    #[test]
    fn test_video_stats_default_hidden_counters_to_zero() {
        let json = r#"{
            "items": [
                {
                    "id": "abc123",
                    "statistics": {"viewCount": "1500", "commentCount": "7"},
                    "contentDetails": {"duration": "PT58S"}
                },
                {"id": "def456"}
            ]
        }"#;
        let response: VideoListResponse = serde_json::from_str(json).unwrap();

        assert_eq!(
            video_stats(response),
            vec![
                RawVideoStats {
                    video_id: "abc123".to_string(),
                    view_count: 1500,
                    like_count: 0,
                    comment_count: 7,
                    duration: 58,
                },
                RawVideoStats {
                    video_id: "def456".to_string(),
                    view_count: 0,
                    like_count: 0,
                    comment_count: 0,
                    duration: 0,
                },
            ]
        );
    }

    #[test]
    fn test_channel_stats_respect_hidden_subscriber_count() {
        let json = r#"{
            "items": [
                {"id": "UC1", "statistics": {"subscriberCount": "12000", "hiddenSubscriberCount": false}},
                {"id": "UC2", "statistics": {"subscriberCount": "999", "hiddenSubscriberCount": true}}
            ]
        }"#;
        let response: ChannelListResponse = serde_json::from_str(json).unwrap();
        let stats = channel_stats(response);

        assert_eq!(stats[0].subscriber_count, 12_000);
        assert_eq!(stats[1].subscriber_count, 0);
    }

    #[test]
    fn test_missing_items_array_is_empty() {
        let response: VideoListResponse = serde_json::from_str("{}").unwrap();
        assert!(video_stats(response).is_empty());
    }

    #[tokio::test]
    async fn test_empty_id_list_skips_network() {
        // Unroutable base URL: any request would fail.
        let client = YouTubeApiV3Client::new(
            "key".to_string(),
            Url::parse("http://127.0.0.1:9/youtube/v3").unwrap(),
            Duration::from_millis(50),
        )
        .unwrap();

        assert!(client.fetch_video_stats(&[]).await.unwrap().is_empty());
        assert!(client.fetch_channel_stats(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_decode_numeric_and_named_entities() {
        assert_eq!(
            decode_html_entities("Rock &#38; Roll &#x27;24 &apos;hi&apos; caf&eacute;"),
            "Rock & Roll '24 'hi' café"
        );
        assert_eq!(decode_html_entities("no entities"), "no entities");
    }

    #[test]
    fn test_truncate_long_error_bodies() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
