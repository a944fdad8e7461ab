//! Normalized per-platform aggregates.
//!
//! Records are plain values: built once per import, replaced wholesale on
//! re-import. Filtering and comparison derive new values from them.

mod instagram;
mod tiktok;
mod youtube;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

pub use instagram::{
    AgeGenderShare, CategoryShare, InstagramData, InstagramPost, InstagramSummary, PageShare,
};
pub use tiktok::{TikTokData, TikTokPost, TikTokSummary};
pub use youtube::{
    BreakdownKind, BreakdownPoint, BreakdownRecord, DailyTotal, ProcessedData, VideoRecord,
    YoutubeSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Youtube,
    Instagram,
    Tiktok,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Youtube, Network::Instagram, Network::Tiktok];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Youtube => "youtube",
            Network::Instagram => "instagram",
            Network::Tiktok => "tiktok",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" | "yt" => Ok(Network::Youtube),
            "instagram" | "ig" => Ok(Network::Instagram),
            "tiktok" | "tt" => Ok(Network::Tiktok),
            other => Err(IngestError::UnknownNetwork(other.to_string())),
        }
    }
}

/// One time-series sample. `data` is kept exactly as exported; it is only
/// read as a calendar date when filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub data: String,
    pub valor: f64,
}

impl MetricPoint {
    pub fn new(data: impl Into<String>, valor: f64) -> Self {
        Self {
            data: data.into(),
            valor,
        }
    }
}

pub(crate) fn sum_series(series: &[MetricPoint]) -> f64 {
    series.iter().map(|p| p.valor).sum()
}

/// The aggregate of any one platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Aggregate {
    Youtube(ProcessedData),
    Instagram(InstagramData),
    Tiktok(TikTokData),
}

impl Aggregate {
    pub fn network(&self) -> Network {
        match self {
            Aggregate::Youtube(_) => Network::Youtube,
            Aggregate::Instagram(_) => Network::Instagram,
            Aggregate::Tiktok(_) => Network::Tiktok,
        }
    }

    /// Reads an aggregate whose platform is known from context (the export
    /// document's `network` field, a stored analysis row).
    pub fn from_value(network: Network, value: serde_json::Value) -> Result<Self, IngestError> {
        Ok(match network {
            Network::Youtube => Aggregate::Youtube(serde_json::from_value(value)?),
            Network::Instagram => Aggregate::Instagram(serde_json::from_value(value)?),
            Network::Tiktok => Aggregate::Tiktok(serde_json::from_value(value)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_str() {
        assert_eq!("YouTube".parse::<Network>().unwrap(), Network::Youtube);
        assert_eq!(" ig ".parse::<Network>().unwrap(), Network::Instagram);
        assert!(matches!(
            "orkut".parse::<Network>(),
            Err(IngestError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn test_network_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Network::Tiktok).unwrap(), "\"tiktok\"");
    }

    #[test]
    fn test_metric_point_json_keys() {
        let json = serde_json::to_value(MetricPoint::new("2024-01-01", 3.0)).unwrap();
        assert_eq!(json, serde_json::json!({"data": "2024-01-01", "valor": 3.0}));
    }

    #[test]
    fn test_aggregate_from_value_uses_network() {
        let mut data = InstagramData::default();
        data.visualizacoes.push(MetricPoint::new("2024-01-01", 5.0));
        data.recompute_resumo();
        let value = serde_json::to_value(Aggregate::Instagram(data.clone())).unwrap();
        let back = Aggregate::from_value(Network::Instagram, value).unwrap();
        assert_eq!(back, Aggregate::Instagram(data));
    }
}
