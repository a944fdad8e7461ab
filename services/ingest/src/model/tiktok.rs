use serde::{Deserialize, Serialize};

use super::{sum_series, MetricPoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TikTokPost {
    pub id: String,
    pub title: String,
    pub link: String,
    pub date: String,
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TikTokSummary {
    pub total_visualizacoes: f64,
    pub total_visualizacoes_perfil: f64,
    pub total_curtidas: f64,
    pub total_comentarios: f64,
    pub total_compartilhamentos: f64,
    pub novos_seguidores: f64,
    pub total_posts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TikTokData {
    pub visualizacoes: Vec<MetricPoint>,
    pub visualizacoes_perfil: Vec<MetricPoint>,
    pub curtidas: Vec<MetricPoint>,
    pub comentarios: Vec<MetricPoint>,
    pub compartilhamentos: Vec<MetricPoint>,
    /// Running follower count per day; not summed.
    pub seguidores: Vec<MetricPoint>,
    /// Day-over-day follower difference.
    pub novos_seguidores: Vec<MetricPoint>,
    pub posts: Vec<TikTokPost>,
    pub resumo: TikTokSummary,
}

impl TikTokData {
    pub fn recompute_resumo(&mut self) {
        self.resumo = TikTokSummary {
            total_visualizacoes: sum_series(&self.visualizacoes),
            total_visualizacoes_perfil: sum_series(&self.visualizacoes_perfil),
            total_curtidas: sum_series(&self.curtidas),
            total_comentarios: sum_series(&self.comentarios),
            total_compartilhamentos: sum_series(&self.compartilhamentos),
            novos_seguidores: sum_series(&self.novos_seguidores),
            total_posts: self.posts.len(),
        };
    }
}
