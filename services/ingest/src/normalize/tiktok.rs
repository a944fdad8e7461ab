//! TikTok Studio exports: a daily overview, a follower history and a
//! per-video content report.

use tracing::debug;

use crate::coerce::CoercionStats;
use crate::model::{MetricPoint, TikTokData, TikTokPost};
use crate::tabular::{Row, Table};

const DATE: &[&str] = &["Data", "Date"];
const VIDEO_VIEWS: &[&str] = &["Visualizações de vídeo", "Visualizacoes de video", "Video Views"];
const PROFILE_VIEWS: &[&str] = &["Visualizações do perfil", "Visualizacoes do perfil", "Profile Views"];
const LIKES: &[&str] = &["Curtidas", "Likes"];
const COMMENTS: &[&str] = &["Comentários", "Comentarios", "Comments"];
const SHARES: &[&str] = &["Compartilhamentos", "Shares"];

const FOLLOWERS: &[&str] = &["Seguidores", "Followers"];
const FOLLOWER_DELTA: &[&str] = &[
    "Diferença de seguidores em relação ao dia anterior",
    "Diferenca de seguidores em relacao ao dia anterior",
    "Difference in followers from previous day",
];

const VIDEO_LINK: &[&str] = &["Link do vídeo", "Link do video", "Video link"];
const VIDEO_TITLE: &[&str] = &["Título do vídeo", "Titulo do video", "Video title"];
const POST_TIME: &[&str] = &["Horário da publicação", "Horario da publicacao", "Post time"];
const TOTAL_VIEWS: &[&str] = &["Total de visualizações", "Total de visualizacoes", "Total views"];
const TOTAL_LIKES: &[&str] = &["Total de curtidas", "Total likes"];
const TOTAL_COMMENTS: &[&str] = &["Total de comentários", "Total de comentarios", "Total comments"];
const TOTAL_SHARES: &[&str] = &[
    "Total de compartilhamentos",
    "Total shares",
];

fn dated_rows(table: &Table) -> impl Iterator<Item = (String, &Row)> {
    table.rows.iter().filter_map(|row| {
        let date = row.text(DATE);
        (!date.is_empty()).then_some((date, row))
    })
}

/// Overview file: one row per day, one column per metric. Fills the five
/// daily series of `data`.
pub fn normalize_overview(table: &Table, data: &mut TikTokData, stats: &mut CoercionStats) {
    for (date, row) in dated_rows(table) {
        data.visualizacoes
            .push(MetricPoint::new(date.clone(), row.number(VIDEO_VIEWS, stats)));
        data.visualizacoes_perfil
            .push(MetricPoint::new(date.clone(), row.number(PROFILE_VIEWS, stats)));
        data.curtidas
            .push(MetricPoint::new(date.clone(), row.number(LIKES, stats)));
        data.comentarios
            .push(MetricPoint::new(date.clone(), row.number(COMMENTS, stats)));
        data.compartilhamentos
            .push(MetricPoint::new(date, row.number(SHARES, stats)));
    }
    debug!(days = data.visualizacoes.len(), "normalized overview");
}

/// Follower history: running total plus the day-over-day difference.
pub fn normalize_followers(table: &Table, data: &mut TikTokData, stats: &mut CoercionStats) {
    for (date, row) in dated_rows(table) {
        data.seguidores
            .push(MetricPoint::new(date.clone(), row.number(FOLLOWERS, stats)));
        data.novos_seguidores
            .push(MetricPoint::new(date, row.number(FOLLOWER_DELTA, stats)));
    }
}

/// Whether an unrecognized file has the content report's columns.
pub fn looks_like_posts(table: &Table) -> bool {
    table.has_any(VIDEO_LINK) && table.has_any(TOTAL_VIEWS)
}

/// Numeric id following `/video/` in a share link.
fn video_id(link: &str) -> Option<String> {
    let (_, rest) = link.split_once("/video/")?;
    let id: String = rest.chars().take_while(char::is_ascii_digit).collect();
    (!id.is_empty()).then_some(id)
}

pub fn normalize_posts(table: &Table, stats: &mut CoercionStats) -> Vec<TikTokPost> {
    let mut posts = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let link = row.text(VIDEO_LINK);
        let title = row.text(VIDEO_TITLE);
        let Some(id) = video_id(&link).or_else(|| (!title.is_empty()).then(|| title.clone()))
        else {
            continue;
        };

        posts.push(TikTokPost {
            id,
            title,
            link,
            date: row.text(POST_TIME),
            views: row.number(TOTAL_VIEWS, stats),
            likes: row.number(TOTAL_LIKES, stats),
            comments: row.number(TOTAL_COMMENTS, stats),
            shares: row.number(TOTAL_SHARES, stats),
        });
    }

    debug!(posts = posts.len(), "normalized content report");
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::{parse_table, TabularOptions};

    fn raw(csv: &str) -> Table {
        parse_table(csv, TabularOptions::RAW)
    }

    #[test]
    fn test_normalize_overview_fills_all_series() {
        let table = raw(
            "Date,Video Views,Profile Views,Likes,Comments,Shares\n\
             2024-01-01,100,10,20,3,1\n\
             2024-01-02,50,5,8,0,2\n",
        );
        let mut data = TikTokData::default();
        let mut stats = CoercionStats::default();
        normalize_overview(&table, &mut data, &mut stats);

        assert_eq!(data.visualizacoes.len(), 2);
        assert_eq!(data.visualizacoes[1].valor, 50.0);
        assert_eq!(data.visualizacoes_perfil[0].valor, 10.0);
        assert_eq!(data.compartilhamentos[1].valor, 2.0);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_normalize_followers() {
        let table = raw(
            "Data,Seguidores,Diferença de seguidores em relação ao dia anterior\n\
             2024-01-01,1000,5\n\
             2024-01-02,1003,3\n",
        );
        let mut data = TikTokData::default();
        let mut stats = CoercionStats::default();
        normalize_followers(&table, &mut data, &mut stats);
        data.recompute_resumo();

        assert_eq!(data.seguidores[1].valor, 1003.0);
        assert_eq!(data.resumo.novos_seguidores, 8.0);
    }

    #[test]
    fn test_video_id_from_link() {
        assert_eq!(
            video_id("https://www.tiktok.com/@conta/video/7312345678901234567?lang=pt"),
            Some("7312345678901234567".to_string())
        );
        assert_eq!(video_id("https://www.tiktok.com/@conta"), None);
    }

    #[test]
    fn test_normalize_posts_id_falls_back_to_title() {
        let table = raw(
            "Video title,Video link,Post time,Total views,Total likes\n\
             Primeiro,https://www.tiktok.com/@c/video/123,2024-01-01,500,40\n\
             Segundo,,2024-01-02,20,1\n\
             ,,2024-01-03,1,1\n",
        );
        let mut stats = CoercionStats::default();
        let posts = normalize_posts(&table, &mut stats);

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "123");
        assert_eq!(posts[0].views, 500.0);
        assert_eq!(posts[1].id, "Segundo");
    }

    #[test]
    fn test_looks_like_posts() {
        assert!(looks_like_posts(&raw("Video link,Total views\nx,1\n")));
        assert!(!looks_like_posts(&raw("Date,Video Views\n2024-01-01,1\n")));
    }
}
