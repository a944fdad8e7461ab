use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of the content report's table data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub published_at: String,
    pub duration_secs: f64,
    pub views: f64,
    pub watch_time_hours: f64,
    pub avg_view_duration_secs: f64,
    pub avg_percentage_viewed: f64,
    pub subscribers: f64,
    pub subscribers_gained: f64,
    pub subscribers_lost: f64,
    pub impressions: f64,
    pub impressions_ctr: f64,
    pub likes: f64,
    pub dislikes: f64,
    pub likes_vs_dislikes_pct: f64,
    pub shares: f64,
    pub comments: f64,
    pub unique_viewers: f64,
    pub new_viewers: f64,
    pub returning_viewers: f64,
    pub casual_viewers: f64,
    pub regular_viewers: f64,
    pub estimated_revenue: f64,
    pub end_screen_clicks: f64,
    pub card_clicks: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakdownKind {
    Countries,
    Cities,
    TrafficSources,
    Demographics,
    ContentTypes,
    DeviceTypes,
    OperatingSystems,
    AudienceBehavior,
}

impl BreakdownKind {
    pub const ALL: [BreakdownKind; 8] = [
        BreakdownKind::Countries,
        BreakdownKind::Cities,
        BreakdownKind::TrafficSources,
        BreakdownKind::Demographics,
        BreakdownKind::ContentTypes,
        BreakdownKind::DeviceTypes,
        BreakdownKind::OperatingSystems,
        BreakdownKind::AudienceBehavior,
    ];

    /// Kinds whose chart-data series can be captured and re-aggregated.
    pub const DATE_FILTERABLE: [BreakdownKind; 5] = [
        BreakdownKind::DeviceTypes,
        BreakdownKind::OperatingSystems,
        BreakdownKind::TrafficSources,
        BreakdownKind::Countries,
        BreakdownKind::Cities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BreakdownKind::Countries => "countries",
            BreakdownKind::Cities => "cities",
            BreakdownKind::TrafficSources => "traffic_sources",
            BreakdownKind::Demographics => "demographics",
            BreakdownKind::ContentTypes => "content_types",
            BreakdownKind::DeviceTypes => "device_types",
            BreakdownKind::OperatingSystems => "operating_systems",
            BreakdownKind::AudienceBehavior => "audience_behavior",
        }
    }

    pub fn is_date_filterable(&self) -> bool {
        Self::DATE_FILTERABLE.contains(self)
    }
}

/// One category row of a breakdown report (a country, a device type, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakdownRecord {
    pub category: String,
    pub views: f64,
    pub views_pct: f64,
    pub watch_time_hours: f64,
    pub watch_time_pct: f64,
    pub avg_view_duration_secs: f64,
    pub avg_percentage_viewed: f64,
    pub subscribers: f64,
    pub impressions: f64,
    pub impressions_ctr: f64,
    pub likes: f64,
    pub shares: f64,
    pub comments: f64,
    pub unique_viewers: f64,
}

/// One day of one category, from a breakdown's chart-data export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakdownPoint {
    pub date: String,
    pub category: String,
    pub views: f64,
    pub watch_time_hours: f64,
    pub subscribers: f64,
    pub impressions: f64,
}

/// Channel-wide totals for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyTotal {
    pub date: String,
    pub views: f64,
    pub watch_time_hours: f64,
    pub subscribers: f64,
    pub impressions: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YoutubeSummary {
    pub total_views: f64,
    pub total_watch_time_hours: f64,
    pub total_subscribers: f64,
    pub subscribers_gained: f64,
    pub subscribers_lost: f64,
    pub total_impressions: f64,
    pub total_likes: f64,
    pub total_dislikes: f64,
    pub total_comments: f64,
    pub total_shares: f64,
    pub total_videos: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessedData {
    pub videos: Vec<VideoRecord>,
    pub countries: Vec<BreakdownRecord>,
    pub cities: Vec<BreakdownRecord>,
    pub traffic_sources: Vec<BreakdownRecord>,
    pub demographics: Vec<BreakdownRecord>,
    pub content_types: Vec<BreakdownRecord>,
    pub device_types: Vec<BreakdownRecord>,
    pub operating_systems: Vec<BreakdownRecord>,
    pub audience_behavior: Vec<BreakdownRecord>,
    /// Chart-data series per breakdown kind, present only when captured.
    pub series: BTreeMap<BreakdownKind, Vec<BreakdownPoint>>,
    pub daily_totals: Vec<DailyTotal>,
    pub summary: YoutubeSummary,
}

impl ProcessedData {
    pub fn breakdown(&self, kind: BreakdownKind) -> &[BreakdownRecord] {
        match kind {
            BreakdownKind::Countries => &self.countries,
            BreakdownKind::Cities => &self.cities,
            BreakdownKind::TrafficSources => &self.traffic_sources,
            BreakdownKind::Demographics => &self.demographics,
            BreakdownKind::ContentTypes => &self.content_types,
            BreakdownKind::DeviceTypes => &self.device_types,
            BreakdownKind::OperatingSystems => &self.operating_systems,
            BreakdownKind::AudienceBehavior => &self.audience_behavior,
        }
    }

    pub fn breakdown_mut(&mut self, kind: BreakdownKind) -> &mut Vec<BreakdownRecord> {
        match kind {
            BreakdownKind::Countries => &mut self.countries,
            BreakdownKind::Cities => &mut self.cities,
            BreakdownKind::TrafficSources => &mut self.traffic_sources,
            BreakdownKind::Demographics => &mut self.demographics,
            BreakdownKind::ContentTypes => &mut self.content_types,
            BreakdownKind::DeviceTypes => &mut self.device_types,
            BreakdownKind::OperatingSystems => &mut self.operating_systems,
            BreakdownKind::AudienceBehavior => &mut self.audience_behavior,
        }
    }

    /// Rebuilds `summary` by summing the per-video fields.
    pub fn recompute_summary(&mut self) {
        let mut summary = YoutubeSummary {
            total_videos: self.videos.len(),
            ..YoutubeSummary::default()
        };
        for video in &self.videos {
            summary.total_views += video.views;
            summary.total_watch_time_hours += video.watch_time_hours;
            summary.total_subscribers += video.subscribers;
            summary.subscribers_gained += video.subscribers_gained;
            summary.subscribers_lost += video.subscribers_lost;
            summary.total_impressions += video.impressions;
            summary.total_likes += video.likes;
            summary.total_dislikes += video.dislikes;
            summary.total_comments += video.comments;
            summary.total_shares += video.shares;
        }
        self.summary = summary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_summary() {
        let mut data = ProcessedData {
            videos: vec![
                VideoRecord {
                    views: 10.0,
                    likes: 2.0,
                    subscribers_gained: 3.0,
                    ..VideoRecord::default()
                },
                VideoRecord {
                    views: 5.0,
                    likes: 1.0,
                    subscribers_lost: 1.0,
                    ..VideoRecord::default()
                },
            ],
            ..ProcessedData::default()
        };
        data.recompute_summary();
        assert_eq!(data.summary.total_views, 15.0);
        assert_eq!(data.summary.total_likes, 3.0);
        assert_eq!(data.summary.subscribers_gained, 3.0);
        assert_eq!(data.summary.subscribers_lost, 1.0);
        assert_eq!(data.summary.total_videos, 2);
    }

    #[test]
    fn test_series_map_serializes_with_kind_keys() {
        let mut data = ProcessedData::default();
        data.series.insert(BreakdownKind::DeviceTypes, Vec::new());
        let json = serde_json::to_value(&data).unwrap();
        assert!(json["series"].get("deviceTypes").is_some());
    }

    #[test]
    fn test_date_filterable_kinds() {
        assert!(BreakdownKind::Cities.is_date_filterable());
        assert!(!BreakdownKind::Demographics.is_date_filterable());
    }
}
