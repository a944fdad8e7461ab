//! YouTube Studio reports. Headers arrive folded (see
//! [`normalize_header`](crate::coerce::normalize_header)), so every key below
//! is lowercase without diacritics.

use tracing::debug;

use super::is_total_row;
use crate::coerce::CoercionStats;
use crate::model::{BreakdownKind, BreakdownPoint, BreakdownRecord, DailyTotal, VideoRecord};
use crate::tabular::{Row, Table};

// =============================================================================
// Header spellings
// =============================================================================

const VIDEO_ID: &[&str] = &["conteudo", "content", "id do video", "video id", "video"];
const TITLE: &[&str] = &["titulo do video", "video title", "titulo", "title"];
const PUBLISHED: &[&str] = &[
    "horario de publicacao do video",
    "video publish time",
    "data de publicacao",
    "publish time",
];
const DURATION: &[&str] = &["duracao", "duration"];
const DATE: &[&str] = &["data", "date", "dia", "day"];

const VIEWS: &[&str] = &["visualizacoes", "views"];
const VIEWS_PCT: &[&str] = &["visualizacoes (%)", "views (%)"];
const WATCH_TIME: &[&str] = &["tempo de exibicao (horas)", "watch time (hours)"];
const WATCH_TIME_PCT: &[&str] = &["tempo de exibicao (horas) (%)", "watch time (hours) (%)"];
const AVG_VIEW_DURATION: &[&str] = &["duracao media da visualizacao", "average view duration"];
const AVG_PCT_VIEWED: &[&str] = &[
    "porcentagem visualizada media (%)",
    "average percentage viewed (%)",
];
const SUBSCRIBERS: &[&str] = &["inscritos", "subscribers"];
const SUBSCRIBERS_GAINED: &[&str] = &["inscricoes obtidas", "subscribers gained"];
const SUBSCRIBERS_LOST: &[&str] = &["inscricoes perdidas", "subscribers lost"];
const IMPRESSIONS: &[&str] = &["impressoes", "impressions"];
const IMPRESSIONS_CTR: &[&str] = &[
    "taxa de cliques de impressoes (%)",
    "impressions click-through rate (%)",
];
// The export alternates between straight and curly quotes around the labels.
const LIKES: &[&str] = &[
    "marcacoes \"gostei\"",
    "marcacoes “gostei”",
    "gostei",
    "likes",
];
const DISLIKES: &[&str] = &[
    "marcacoes \"nao gostei\"",
    "marcacoes “nao gostei”",
    "nao gostei",
    "dislikes",
];
const LIKES_VS_DISLIKES: &[&str] = &[
    "marcacoes \"gostei\" (vs. marcacoes \"nao gostei\") (%)",
    "marcacoes “gostei” (vs. marcacoes “nao gostei”) (%)",
    "likes (vs. dislikes) (%)",
];
const SHARES: &[&str] = &["compartilhamentos", "shares"];
const COMMENTS: &[&str] = &[
    "comentarios adicionados",
    "comments added",
    "comentarios",
    "comments",
];
const UNIQUE_VIEWERS: &[&str] = &["espectadores unicos", "unique viewers"];
const NEW_VIEWERS: &[&str] = &["novos espectadores", "new viewers"];
const RETURNING_VIEWERS: &[&str] = &["espectadores recorrentes", "returning viewers"];
const CASUAL_VIEWERS: &[&str] = &["espectadores casuais", "casual viewers"];
const REGULAR_VIEWERS: &[&str] = &["espectadores regulares", "regular viewers"];
const ESTIMATED_REVENUE: &[&str] = &[
    "receita estimada (usd)",
    "sua receita estimada (usd)",
    "estimated revenue (usd)",
    "your estimated revenue (usd)",
];
const END_SCREEN_CLICKS: &[&str] = &[
    "cliques em elementos da tela final",
    "end screen element clicks",
];
const CARD_CLICKS: &[&str] = &["cliques em cards", "card clicks"];

const VIEWER_AGE: &[&str] = &["idade do espectador", "viewer age"];
const VIEWER_GENDER: &[&str] = &["genero do espectador", "viewer gender"];

/// Identifying column of each breakdown report.
pub fn category_keys(kind: BreakdownKind) -> &'static [&'static str] {
    match kind {
        BreakdownKind::Countries => &["geografia", "geography", "pais", "country"],
        BreakdownKind::Cities => &["cidades", "cidade", "cities", "city"],
        BreakdownKind::TrafficSources => &["origem do trafego", "traffic source"],
        BreakdownKind::Demographics => &[
            "idade do espectador",
            "viewer age",
            "genero do espectador",
            "viewer gender",
        ],
        BreakdownKind::ContentTypes => &["tipo de conteudo", "content type"],
        BreakdownKind::DeviceTypes => &["tipo de dispositivo", "device type"],
        BreakdownKind::OperatingSystems => &["sistema operacional", "operating system"],
        BreakdownKind::AudienceBehavior => &[
            "espectadores novos e recorrentes",
            "new and returning viewers",
            "tipo de espectador",
            "viewer type",
        ],
    }
}

fn category_of(kind: BreakdownKind, row: &Row) -> String {
    if kind == BreakdownKind::Demographics {
        let age = row.text(VIEWER_AGE);
        let gender = row.text(VIEWER_GENDER);
        return match (age.is_empty(), gender.is_empty()) {
            (false, false) => format!("{age} / {gender}"),
            (false, true) => age,
            _ => gender,
        };
    }
    row.text(category_keys(kind))
}

// =============================================================================
// Table data
// =============================================================================

/// Content report: one record per video.
pub fn normalize_videos(table: &Table, stats: &mut CoercionStats) -> Vec<VideoRecord> {
    let mut videos = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let id = row.text(VIDEO_ID);
        if id.is_empty() || is_total_row(&id) {
            continue;
        }

        videos.push(VideoRecord {
            id,
            title: row.text(TITLE),
            published_at: row.text(PUBLISHED),
            duration_secs: row.seconds(DURATION, stats),
            views: row.number(VIEWS, stats),
            watch_time_hours: row.number(WATCH_TIME, stats),
            avg_view_duration_secs: row.seconds(AVG_VIEW_DURATION, stats),
            avg_percentage_viewed: row.number(AVG_PCT_VIEWED, stats),
            subscribers: row.number(SUBSCRIBERS, stats),
            subscribers_gained: row.number(SUBSCRIBERS_GAINED, stats),
            subscribers_lost: row.number(SUBSCRIBERS_LOST, stats),
            impressions: row.number(IMPRESSIONS, stats),
            impressions_ctr: row.number(IMPRESSIONS_CTR, stats),
            likes: row.number(LIKES, stats),
            dislikes: row.number(DISLIKES, stats),
            likes_vs_dislikes_pct: row.number(LIKES_VS_DISLIKES, stats),
            shares: row.number(SHARES, stats),
            comments: row.number(COMMENTS, stats),
            unique_viewers: row.number(UNIQUE_VIEWERS, stats),
            new_viewers: row.number(NEW_VIEWERS, stats),
            returning_viewers: row.number(RETURNING_VIEWERS, stats),
            casual_viewers: row.number(CASUAL_VIEWERS, stats),
            regular_viewers: row.number(REGULAR_VIEWERS, stats),
            estimated_revenue: row.number(ESTIMATED_REVENUE, stats),
            end_screen_clicks: row.number(END_SCREEN_CLICKS, stats),
            card_clicks: row.number(CARD_CLICKS, stats),
        });
    }

    debug!(videos = videos.len(), "normalized content report");
    videos
}

/// Any breakdown report: one record per category.
pub fn normalize_breakdown(
    kind: BreakdownKind,
    table: &Table,
    stats: &mut CoercionStats,
) -> Vec<BreakdownRecord> {
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let category = category_of(kind, row);
        if category.is_empty() || is_total_row(&category) {
            continue;
        }

        records.push(BreakdownRecord {
            category,
            views: row.number(VIEWS, stats),
            views_pct: row.number(VIEWS_PCT, stats),
            watch_time_hours: row.number(WATCH_TIME, stats),
            watch_time_pct: row.number(WATCH_TIME_PCT, stats),
            avg_view_duration_secs: row.seconds(AVG_VIEW_DURATION, stats),
            avg_percentage_viewed: row.number(AVG_PCT_VIEWED, stats),
            subscribers: row.number(SUBSCRIBERS, stats),
            impressions: row.number(IMPRESSIONS, stats),
            impressions_ctr: row.number(IMPRESSIONS_CTR, stats),
            likes: row.number(LIKES, stats),
            shares: row.number(SHARES, stats),
            comments: row.number(COMMENTS, stats),
            unique_viewers: row.number(UNIQUE_VIEWERS, stats),
        });
    }

    debug!(kind = kind.as_str(), rows = records.len(), "normalized breakdown");
    records
}

// =============================================================================
// Chart data
// =============================================================================

/// Chart-data variant of a breakdown: one point per day and category.
pub fn normalize_breakdown_series(
    kind: BreakdownKind,
    table: &Table,
    stats: &mut CoercionStats,
) -> Vec<BreakdownPoint> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let date = row.text(DATE);
            let category = category_of(kind, row);
            if date.is_empty() || category.is_empty() || is_total_row(&category) {
                return None;
            }
            Some(BreakdownPoint {
                date,
                category,
                views: row.number(VIEWS, stats),
                watch_time_hours: row.number(WATCH_TIME, stats),
                subscribers: row.number(SUBSCRIBERS, stats),
                impressions: row.number(IMPRESSIONS, stats),
            })
        })
        .collect()
}

/// The content report's `Totais` file: channel totals per day.
pub fn normalize_daily_totals(table: &Table, stats: &mut CoercionStats) -> Vec<DailyTotal> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let date = row.text(DATE);
            if date.is_empty() || is_total_row(&date) {
                return None;
            }
            Some(DailyTotal {
                date,
                views: row.number(VIEWS, stats),
                watch_time_hours: row.number(WATCH_TIME, stats),
                subscribers: row.number(SUBSCRIBERS, stats),
                impressions: row.number(IMPRESSIONS, stats),
            })
        })
        .collect()
}
