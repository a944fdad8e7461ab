use serde::{Deserialize, Serialize};

use super::{sum_series, MetricPoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPost {
    pub id: String,
    pub timestamp: String,
    pub caption: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub permalink: String,
    pub views: f64,
    pub reach: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub saves: f64,
}

/// Age bracket split by gender. `porcentagem` is the sum of both values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeGenderShare {
    pub categoria: String,
    pub valor_mulheres: f64,
    pub valor_homens: f64,
    pub porcentagem: f64,
}

impl AgeGenderShare {
    pub fn new(categoria: impl Into<String>, valor_mulheres: f64, valor_homens: f64) -> Self {
        Self {
            categoria: categoria.into(),
            valor_mulheres,
            valor_homens,
            porcentagem: valor_mulheres + valor_homens,
        }
    }
}

/// City or country share of the audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub categoria: String,
    pub porcentagem: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageShare {
    pub nome: String,
    pub porcentagem: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramSummary {
    pub total_visualizacoes: f64,
    pub total_alcance: f64,
    pub novos_seguidores: f64,
    pub total_interacoes: f64,
    pub total_visitas: f64,
    pub total_cliques_link: f64,
    pub total_posts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstagramData {
    pub visualizacoes: Vec<MetricPoint>,
    pub alcance: Vec<MetricPoint>,
    pub seguidores: Vec<MetricPoint>,
    pub interacoes: Vec<MetricPoint>,
    pub visitas: Vec<MetricPoint>,
    pub cliques_link: Vec<MetricPoint>,
    pub publico_idade_genero: Vec<AgeGenderShare>,
    pub publico_cidades: Vec<CategoryShare>,
    pub publico_paises: Vec<CategoryShare>,
    pub publico_paginas: Vec<PageShare>,
    pub posts: Vec<InstagramPost>,
    pub resumo: InstagramSummary,
}

impl InstagramData {
    /// Rebuilds `resumo` from the current series and posts.
    pub fn recompute_resumo(&mut self) {
        self.resumo = InstagramSummary {
            total_visualizacoes: sum_series(&self.visualizacoes),
            total_alcance: sum_series(&self.alcance),
            novos_seguidores: sum_series(&self.seguidores),
            total_interacoes: sum_series(&self.interacoes),
            total_visitas: sum_series(&self.visitas),
            total_cliques_link: sum_series(&self.cliques_link),
            total_posts: self.posts.len(),
        };
    }

    /// Total saves across posts; the metric files carry no saves series.
    pub fn total_saves(&self) -> f64 {
        self.posts.iter().map(|p| p.saves).sum()
    }
}
