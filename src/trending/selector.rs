use std::cmp::Ordering;

use super::models::{ScoredVideo, TrendPage};
use crate::error::{Result, TrendError};

/// Quality thresholds a video must all meet. A zero threshold is inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionFilter {
    pub min_views: u64,
    pub min_subscribers: u64,
}

impl SelectionFilter {
    pub fn accepts(&self, video: &ScoredVideo) -> bool {
        video.video.views >= self.min_views && video.video.subscribers >= self.min_subscribers
    }
}

/// Filters, ranks by descending trend score and cuts out one 1-indexed page.
///
/// The sort is stable, so equal scores keep their search-result order and
/// repeated calls over the same input page identically. A page past the end
/// is empty, not an error.
pub fn select(
    scored: Vec<ScoredVideo>,
    filter: SelectionFilter,
    page_size: u32,
    page: u32,
) -> Result<TrendPage> {
    if page < 1 {
        return Err(TrendError::Validation("page must be 1 or greater".to_string()));
    }
    if page_size == 0 {
        return Err(TrendError::Validation("page size must be greater than 0".to_string()));
    }

    let mut ranked: Vec<ScoredVideo> = scored.into_iter().filter(|v| filter.accepts(v)).collect();
    ranked.sort_by(|a, b| {
        b.trend_score
            .partial_cmp(&a.trend_score)
            .unwrap_or(Ordering::Equal)
    });

    let total_results = ranked.len();
    let size = page_size as usize;
    let total_pages = total_results.div_ceil(size);
    let start = (page as usize - 1).saturating_mul(size);

    let items = ranked.into_iter().skip(start).take(size).collect();

    Ok(TrendPage {
        items,
        page,
        page_size,
        total_results,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trending::models::{EnrichedVideo, TrendTier};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn scored(id: &str, score: f64, views: u64, subscribers: u64) -> ScoredVideo {
        ScoredVideo {
            video: EnrichedVideo {
                video_id: id.to_string(),
                title: id.to_string(),
                channel: "channel".to_string(),
                channel_id: "chan".to_string(),
                thumbnail_url: None,
                published_at: Utc::now(),
                views,
                likes: 0,
                comments: 0,
                subscribers,
                hours_since_upload: 1.0,
                duration: 20,
            },
            views_per_hour: views as f64,
            engagement_rate: 0.0,
            subscriber_ratio: 0.0,
            trend_score: score,
            trend_tier: TrendTier::Normal,
        }
    }

    fn ids(page: &TrendPage) -> Vec<&str> {
        page.items.iter().map(|v| v.video.video_id.as_str()).collect()
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let input = vec![
            scored("low", 1.0, 10, 0),
            scored("tie-first", 5.0, 10, 0),
            scored("high", 9.0, 10, 0),
            scored("tie-second", 5.0, 10, 0),
            scored("tie-third", 5.0, 10, 0),
        ];

        let page = select(input, SelectionFilter::default(), 10, 1).unwrap();
        assert_eq!(
            ids(&page),
            vec!["high", "tie-first", "tie-second", "tie-third", "low"]
        );
        for pair in page.items.windows(2) {
            assert!(pair[0].trend_score >= pair[1].trend_score);
        }
    }

    #[test]
    fn test_filters_are_a_conjunction() {
        let input = vec![
            scored("both", 3.0, 5_000, 100),
            scored("few-views", 2.0, 10, 100),
            scored("few-subs", 1.0, 5_000, 1),
        ];
        let filter = SelectionFilter {
            min_views: 1_000,
            min_subscribers: 50,
        };

        let page = select(input, filter, 10, 1).unwrap();
        assert_eq!(ids(&page), vec!["both"]);
        assert_eq!(page.total_results, 1);
    }

    #[test]
    fn test_pagination_boundaries() {
        let input: Vec<ScoredVideo> = (0..25)
            .map(|i| scored(&format!("v{:02}", i + 1), 100.0 - i as f64, 10, 0))
            .collect();

        let first = select(input.clone(), SelectionFilter::default(), 10, 1).unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].video.video_id, "v01");
        assert_eq!(first.items[9].video.video_id, "v10");
        assert_eq!(first.total_pages, 3);

        let third = select(input.clone(), SelectionFilter::default(), 10, 3).unwrap();
        assert_eq!(ids(&third), vec!["v21", "v22", "v23", "v24", "v25"]);

        let beyond = select(input, SelectionFilter::default(), 10, 10).unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_results, 25);
    }

    #[test]
    fn test_page_zero_is_rejected() {
        let err = select(Vec::new(), SelectionFilter::default(), 10, 0).unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));

        let err = select(Vec::new(), SelectionFilter::default(), 0, 1).unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));
    }
}
