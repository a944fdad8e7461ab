//! Meta Business Suite exports. Headers are kept as exported, so each field
//! lists both the Portuguese and the English spelling.

use tracing::debug;

use crate::coerce::CoercionStats;
use crate::model::{InstagramPost, MetricPoint};
use crate::tabular::Table;

const DATE: &[&str] = &["Data", "Date"];
const VALUE: &[&str] = &["Valor", "Primary", "Value", "Principal"];

const POST_ID: &[&str] = &["Identificação do post", "Identificacao do post", "Post ID"];
const PUBLISHED: &[&str] = &["Horário de publicação", "Horario de publicacao", "Publish time"];
const CAPTION: &[&str] = &["Descrição", "Descricao", "Description"];
const POST_TYPE: &[&str] = &["Tipo de post", "Post type"];
const PERMALINK: &[&str] = &["Link permanente", "Permalink"];
const VIEWS: &[&str] = &["Visualizações", "Visualizacoes", "Views", "Impressões", "Impressions"];
const REACH: &[&str] = &["Alcance", "Reach"];
const LIKES: &[&str] = &["Curtidas", "Likes"];
const COMMENTS: &[&str] = &["Comentários", "Comentarios", "Comments"];
const SHARES: &[&str] = &["Compartilhamentos", "Shares"];
const SAVES: &[&str] = &["Salvamentos", "Saves"];

/// A single-metric file (`Data`, `Valor`) as a daily series.
///
/// Newer exports name the value column `Primary`; when none of the known
/// spellings is present the first non-date column is used.
pub fn normalize_metric_series(table: &Table, stats: &mut CoercionStats) -> Vec<MetricPoint> {
    let fallback = table.first_header_except(DATE).map(str::to_string);
    let mut series = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let data = row.text(DATE);
        if data.is_empty() {
            continue;
        }
        let valor = if row.first_present(VALUE).is_some() {
            row.number(VALUE, stats)
        } else {
            match fallback.as_deref() {
                Some(column) => row.number(&[column], stats),
                None => row.number(VALUE, stats),
            }
        };
        series.push(MetricPoint::new(data, valor));
    }

    series
}

/// Whether an unrecognized file has the per-post export's columns.
pub fn looks_like_posts(table: &Table) -> bool {
    table.has_any(POST_ID) && table.has_any(PUBLISHED)
}

pub fn normalize_posts(table: &Table, stats: &mut CoercionStats) -> Vec<InstagramPost> {
    let mut posts = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let id = row.text(POST_ID);
        if id.is_empty() {
            continue;
        }
        posts.push(InstagramPost {
            id,
            timestamp: row.text(PUBLISHED),
            caption: row.text(CAPTION),
            post_type: row.text(POST_TYPE),
            permalink: row.text(PERMALINK),
            views: row.number(VIEWS, stats),
            reach: row.number(REACH, stats),
            likes: row.number(LIKES, stats),
            comments: row.number(COMMENTS, stats),
            shares: row.number(SHARES, stats),
            saves: row.number(SAVES, stats),
        });
    }

    debug!(posts = posts.len(), "normalized post export");
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::{parse_table, strip_title_line, TabularOptions};

    fn raw(csv: &str) -> Table {
        parse_table(strip_title_line(csv), TabularOptions::RAW)
    }

    #[test]
    fn test_metric_series_with_valor_column() {
        let table = raw("Data,Valor\n2024-01-01,100\n2024-01-02,200\n");
        let mut stats = CoercionStats::default();
        let series = normalize_metric_series(&table, &mut stats);
        assert_eq!(
            series,
            vec![
                MetricPoint::new("2024-01-01", 100.0),
                MetricPoint::new("2024-01-02", 200.0)
            ]
        );
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_metric_series_meta_preamble_and_primary() {
        let csv = "sep=,\n\"Alcance\"\n\"Data\",\"Primary\"\n\"2024-01-01T00:00:00\",\"7\"\n";
        let mut stats = CoercionStats::default();
        let series = normalize_metric_series(&raw(csv), &mut stats);
        assert_eq!(series, vec![MetricPoint::new("2024-01-01T00:00:00", 7.0)]);
    }

    #[test]
    fn test_metric_series_falls_back_to_first_value_column() {
        let table = raw("Date,Seguidores no Instagram\n2024-01-01,3\n");
        let mut stats = CoercionStats::default();
        let series = normalize_metric_series(&table, &mut stats);
        assert_eq!(series[0].valor, 3.0);
    }

    #[test]
    fn test_metric_series_comma_decimal_and_missing_date() {
        let table = raw("Data;Valor\n2024-01-01;\"1,5\"\n;9\n");
        let mut stats = CoercionStats::default();
        let series = normalize_metric_series(&table, &mut stats);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].valor, 1.5);
    }

    #[test]
    fn test_looks_like_posts() {
        let posts = raw("Identificação do post,Horário de publicação,Curtidas\n1,2024-01-01,3\n");
        assert!(looks_like_posts(&posts));
        assert!(!looks_like_posts(&raw("Data,Valor\n2024-01-01,1\n")));
    }

    #[test]
    fn test_normalize_posts_english_headers() {
        let table = raw(
            "Post ID,Publish time,Description,Post type,Permalink,Views,Reach,Likes,Comments,Shares,Saves\n\
             17900,01/02/2024 10:00,Hello,IG reel,https://instagram.com/p/x,50,40,10,2,1,4\n\
             ,01/02/2024 10:00,no id,IG reel,,1,1,1,1,1,1\n",
        );
        let mut stats = CoercionStats::default();
        let posts = normalize_posts(&table, &mut stats);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "17900");
        assert_eq!(posts[0].post_type, "IG reel");
        assert_eq!(posts[0].views, 50.0);
        assert_eq!(posts[0].saves, 4.0);
    }

    #[test]
    fn test_normalize_posts_missing_counts_default_to_zero() {
        let table = raw("Identificação do post,Horário de publicação\n1,2024-01-01\n");
        let mut stats = CoercionStats::default();
        let posts = normalize_posts(&table, &mut stats);
        assert_eq!(posts[0].likes, 0.0);
        assert_eq!(stats.missing, 6);
    }
}
