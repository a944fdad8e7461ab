//! Cross-platform comparison: one common projection per platform.

use serde::{Deserialize, Serialize};

use crate::model::{Aggregate, InstagramData, Network, ProcessedData, TikTokData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformComparison {
    pub network: Network,
    pub views: f64,
    pub reach: f64,
    pub engagement: f64,
    /// `engagement / views * 100`, or 0 without views.
    pub engagement_rate: f64,
    pub follower_growth: f64,
    pub post_count: usize,
    pub avg_views_per_post: f64,
    pub saves: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl PlatformComparison {
    fn new(
        network: Network,
        views: f64,
        reach: f64,
        engagement: f64,
        follower_growth: f64,
        post_count: usize,
        saves: f64,
    ) -> Self {
        Self {
            network,
            views,
            reach,
            engagement,
            engagement_rate: ratio(engagement, views) * 100.0,
            follower_growth,
            post_count,
            avg_views_per_post: ratio(views, post_count as f64),
            saves,
        }
    }

    pub fn from_youtube(data: &ProcessedData) -> Self {
        let s = &data.summary;
        Self::new(
            Network::Youtube,
            s.total_views,
            s.total_impressions,
            s.total_likes + s.total_comments + s.total_shares,
            s.subscribers_gained - s.subscribers_lost,
            s.total_videos,
            0.0,
        )
    }

    pub fn from_instagram(data: &InstagramData) -> Self {
        let r = &data.resumo;
        Self::new(
            Network::Instagram,
            r.total_visualizacoes,
            r.total_alcance,
            r.total_interacoes,
            r.novos_seguidores,
            r.total_posts,
            data.total_saves(),
        )
    }

    pub fn from_tiktok(data: &TikTokData) -> Self {
        let r = &data.resumo;
        Self::new(
            Network::Tiktok,
            r.total_visualizacoes,
            r.total_visualizacoes_perfil,
            r.total_curtidas + r.total_comentarios + r.total_compartilhamentos,
            r.novos_seguidores,
            r.total_posts,
            0.0,
        )
    }

    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        match aggregate {
            Aggregate::Youtube(data) => Self::from_youtube(data),
            Aggregate::Instagram(data) => Self::from_instagram(data),
            Aggregate::Tiktok(data) => Self::from_tiktok(data),
        }
    }

    pub fn field(&self, field: ComparisonField) -> f64 {
        match field {
            ComparisonField::Views => self.views,
            ComparisonField::Reach => self.reach,
            ComparisonField::Engagement => self.engagement,
            ComparisonField::EngagementRate => self.engagement_rate,
            ComparisonField::FollowerGrowth => self.follower_growth,
            ComparisonField::PostCount => self.post_count as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonField {
    Views,
    Reach,
    Engagement,
    EngagementRate,
    FollowerGrowth,
    PostCount,
}

impl ComparisonField {
    pub const ALL: [ComparisonField; 6] = [
        ComparisonField::Views,
        ComparisonField::Reach,
        ComparisonField::Engagement,
        ComparisonField::EngagementRate,
        ComparisonField::FollowerGrowth,
        ComparisonField::PostCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonField::Views => "views",
            ComparisonField::Reach => "reach",
            ComparisonField::Engagement => "engagement",
            ComparisonField::EngagementRate => "engagementRate",
            ComparisonField::FollowerGrowth => "followerGrowth",
            ComparisonField::PostCount => "postCount",
        }
    }
}

/// Platform with the highest `field`. On ties the earlier entry wins.
pub fn best_performer(items: &[PlatformComparison], field: ComparisonField) -> Option<Network> {
    let mut best: Option<&PlatformComparison> = None;
    for item in items {
        match best {
            Some(current) if item.field(field) <= current.field(field) => {}
            _ => best = Some(item),
        }
    }
    best.map(|item| item.network)
}
