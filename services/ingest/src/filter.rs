//! Date-range filtering of platform aggregates.
//!
//! Filtering never mutates its input. Relative windows (`"7d"`) end at the
//! most recent date found in the aggregate itself, not at the wall clock.
//! Records whose date cannot be read are kept only under [`DateRange::All`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::coerce::parse_date_checked;
use crate::error::IngestError;
use crate::model::{
    Aggregate, BreakdownKind, BreakdownPoint, BreakdownRecord, InstagramData, MetricPoint,
    ProcessedData, TikTokData,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateRange {
    #[default]
    All,
    /// The last N days, inclusive, ending at the newest date in the data.
    LastDays(u32),
    /// Inclusive calendar range.
    Between { start: NaiveDate, end: NaiveDate },
}

impl DateRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, IngestError> {
        if start > end {
            return Err(IngestError::InvalidRange {
                input: format!("{start}..{end}"),
                reason: "start is after end".to_string(),
            });
        }
        Ok(DateRange::Between { start, end })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRange::All => f.write_str("all"),
            DateRange::LastDays(days) => write!(f, "{days}d"),
            DateRange::Between { start, end } => write!(f, "{start}..{end}"),
        }
    }
}

impl FromStr for DateRange {
    type Err = IngestError;

    /// Accepts `all`, `<n>d` and `YYYY-MM-DD..YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        let invalid = |reason: &str| IngestError::InvalidRange {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if input == "all" {
            return Ok(DateRange::All);
        }
        if let Some((start, end)) = input.split_once("..") {
            let parse = |d: &str| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .map_err(|_| invalid("dates must be YYYY-MM-DD"))
            };
            return DateRange::between(parse(start)?, parse(end)?);
        }
        if let Some(days) = input.strip_suffix('d') {
            return match days.parse::<u32>() {
                Ok(0) => Err(invalid("window must be at least one day")),
                Ok(days) => Ok(DateRange::LastDays(days)),
                Err(_) => Err(invalid("expected a number of days like 30d")),
            };
        }
        Err(invalid("expected all, <n>d or start..end"))
    }
}

// =============================================================================
// Window resolution
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bounds {
    Nothing,
    Between(NaiveDate, NaiveDate),
}

/// A resolved range plus the "today" used to read year-less dates.
struct Window {
    bounds: Bounds,
    today: NaiveDate,
}

impl Window {
    fn resolve(range: DateRange, anchor: Option<NaiveDate>, today: NaiveDate) -> Self {
        let bounds = match (range, anchor) {
            (DateRange::Between { start, end }, _) => Bounds::Between(start, end),
            (DateRange::LastDays(days), Some(anchor)) => {
                // Windows reaching past the calendar start keep every dated record.
                let start = anchor
                    .checked_sub_signed(Duration::days(i64::from(days) - 1))
                    .unwrap_or(NaiveDate::MIN);
                Bounds::Between(start, anchor)
            }
            (DateRange::LastDays(_), None) | (DateRange::All, _) => Bounds::Nothing,
        };
        Self { bounds, today }
    }

    fn keeps(&self, raw: &str) -> bool {
        let Bounds::Between(start, end) = self.bounds else {
            return false;
        };
        let date = parse_date_checked(raw, self.today);
        !date.defaulted && start <= date.value && date.value <= end
    }

    fn series(&self, series: &[MetricPoint]) -> Vec<MetricPoint> {
        series.iter().filter(|p| self.keeps(&p.data)).cloned().collect()
    }
}

/// Newest readable date among `dates`.
fn newest<'a>(dates: impl Iterator<Item = &'a str>, today: NaiveDate) -> Option<NaiveDate> {
    dates
        .map(|raw| parse_date_checked(raw, today))
        .filter(|d| !d.defaulted)
        .map(|d| d.value)
        .max()
}

fn series_dates<'a>(all: &'a [&'a [MetricPoint]]) -> impl Iterator<Item = &'a str> {
    all.iter().flat_map(|s| s.iter().map(|p| p.data.as_str()))
}

// =============================================================================
// Per-platform filtering
// =============================================================================

fn youtube_anchor(data: &ProcessedData, today: NaiveDate) -> Option<NaiveDate> {
    let videos = data.videos.iter().map(|v| v.published_at.as_str());
    let totals = data.daily_totals.iter().map(|t| t.date.as_str());
    let series = data.series.values().flatten().map(|p| p.date.as_str());
    newest(videos.chain(totals).chain(series), today)
}

/// Per-category totals from filtered chart points. Fields the points do not
/// carry (percentages, averages, engagement) are left at 0.
fn reaggregate(points: &[BreakdownPoint]) -> Vec<BreakdownRecord> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut records: Vec<BreakdownRecord> = Vec::new();

    for point in points {
        let idx = *index.entry(point.category.as_str()).or_insert_with(|| {
            records.push(BreakdownRecord {
                category: point.category.clone(),
                ..BreakdownRecord::default()
            });
            records.len() - 1
        });
        let record = &mut records[idx];
        record.views += point.views;
        record.watch_time_hours += point.watch_time_hours;
        record.subscribers += point.subscribers;
        record.impressions += point.impressions;
    }

    records.sort_by(|a, b| b.views.total_cmp(&a.views));
    records
}

fn filter_youtube(data: &ProcessedData, window: &Window) -> ProcessedData {
    let mut filtered = data.clone();

    filtered.videos.retain(|v| window.keeps(&v.published_at));
    filtered.daily_totals.retain(|t| window.keeps(&t.date));

    for kind in BreakdownKind::DATE_FILTERABLE {
        let Some(points) = data.series.get(&kind) else {
            continue;
        };
        let kept: Vec<BreakdownPoint> = points
            .iter()
            .filter(|p| window.keeps(&p.date))
            .cloned()
            .collect();
        *filtered.breakdown_mut(kind) = reaggregate(&kept);
        filtered.series.insert(kind, kept);
    }

    filtered.recompute_summary();
    filtered
}

fn instagram_anchor(data: &InstagramData, today: NaiveDate) -> Option<NaiveDate> {
    let all: [&[MetricPoint]; 6] = [
        &data.visualizacoes,
        &data.alcance,
        &data.seguidores,
        &data.interacoes,
        &data.visitas,
        &data.cliques_link,
    ];
    let posts = data.posts.iter().map(|p| p.timestamp.as_str());
    newest(series_dates(&all).chain(posts), today)
}

fn filter_instagram(data: &InstagramData, window: &Window) -> InstagramData {
    let mut filtered = InstagramData {
        visualizacoes: window.series(&data.visualizacoes),
        alcance: window.series(&data.alcance),
        seguidores: window.series(&data.seguidores),
        interacoes: window.series(&data.interacoes),
        visitas: window.series(&data.visitas),
        cliques_link: window.series(&data.cliques_link),
        posts: data
            .posts
            .iter()
            .filter(|p| window.keeps(&p.timestamp))
            .cloned()
            .collect(),
        ..data.clone()
    };
    filtered.recompute_resumo();
    filtered
}

fn tiktok_anchor(data: &TikTokData, today: NaiveDate) -> Option<NaiveDate> {
    let all: [&[MetricPoint]; 7] = [
        &data.visualizacoes,
        &data.visualizacoes_perfil,
        &data.curtidas,
        &data.comentarios,
        &data.compartilhamentos,
        &data.seguidores,
        &data.novos_seguidores,
    ];
    let posts = data.posts.iter().map(|p| p.date.as_str());
    newest(series_dates(&all).chain(posts), today)
}

fn filter_tiktok(data: &TikTokData, window: &Window) -> TikTokData {
    let mut filtered = TikTokData {
        visualizacoes: window.series(&data.visualizacoes),
        visualizacoes_perfil: window.series(&data.visualizacoes_perfil),
        curtidas: window.series(&data.curtidas),
        comentarios: window.series(&data.comentarios),
        compartilhamentos: window.series(&data.compartilhamentos),
        seguidores: window.series(&data.seguidores),
        novos_seguidores: window.series(&data.novos_seguidores),
        posts: data
            .posts
            .iter()
            .filter(|p| window.keeps(&p.date))
            .cloned()
            .collect(),
        resumo: data.resumo.clone(),
    };
    filtered.recompute_resumo();
    filtered
}

/// Newest readable date across all date-bearing records.
pub fn anchor_date(aggregate: &Aggregate, today: NaiveDate) -> Option<NaiveDate> {
    match aggregate {
        Aggregate::Youtube(data) => youtube_anchor(data, today),
        Aggregate::Instagram(data) => instagram_anchor(data, today),
        Aggregate::Tiktok(data) => tiktok_anchor(data, today),
    }
}

/// Filters relative to the current UTC day (used for year-less dates).
pub fn filter_aggregate(aggregate: &Aggregate, range: DateRange) -> Aggregate {
    filter_aggregate_at(aggregate, range, Utc::now().date_naive())
}

pub fn filter_aggregate_at(aggregate: &Aggregate, range: DateRange, today: NaiveDate) -> Aggregate {
    if range == DateRange::All {
        return aggregate.clone();
    }

    let window = Window::resolve(range, anchor_date(aggregate, today), today);
    match aggregate {
        Aggregate::Youtube(data) => Aggregate::Youtube(filter_youtube(data, &window)),
        Aggregate::Instagram(data) => Aggregate::Instagram(filter_instagram(data, &window)),
        Aggregate::Tiktok(data) => Aggregate::Tiktok(filter_tiktok(data, &window)),
    }
}
