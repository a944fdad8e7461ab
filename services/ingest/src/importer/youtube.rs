use super::{find_route, Entry, ImportDiagnostics, Matcher, Route};
use crate::model::{BreakdownKind, ProcessedData};
use crate::normalize::youtube as normalize;
use crate::tabular::{parse_table, TabularOptions};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Handler {
    Videos,
    DailyTotals,
    Breakdown(BreakdownKind),
    Series(BreakdownKind),
}

const TABLE_DATA: &[&str] = &["dados da tabela", "table data"];
const CHART_DATA: &[&str] = &["dados do grafico", "chart data"];
const TOTALS: &[&str] = &["totais", "totals"];

const CONTENT: &[&str] = &["conteudo", "content"];
const CONTENT_TYPE: &[&str] = &["tipo de conteudo", "content type"];
const GEOGRAPHY: &[&str] = &["geografia", "geography"];
const CITIES: &[&str] = &["cidades", "cities"];
const TRAFFIC: &[&str] = &["origem do trafego", "traffic source"];
const DEMOGRAPHICS: &[&str] = &[
    "idade do espectador",
    "genero do espectador",
    "viewer age",
    "viewer gender",
    "dados demograficos",
    "demographics",
];
const DEVICE: &[&str] = &["tipo de dispositivo", "device type"];
const OS: &[&str] = &["sistema operacional", "operating system"];
const BEHAVIOR: &[&str] = &[
    "espectadores novos e recorrentes",
    "new and returning viewers",
    "tipo de espectador",
    "viewer type",
];

/// Report folder keywords per breakdown kind.
const BREAKDOWNS: [(BreakdownKind, &[&str]); 8] = [
    (BreakdownKind::ContentTypes, CONTENT_TYPE),
    (BreakdownKind::Countries, GEOGRAPHY),
    (BreakdownKind::Cities, CITIES),
    (BreakdownKind::TrafficSources, TRAFFIC),
    (BreakdownKind::Demographics, DEMOGRAPHICS),
    (BreakdownKind::DeviceTypes, DEVICE),
    (BreakdownKind::OperatingSystems, OS),
    (BreakdownKind::AudienceBehavior, BEHAVIOR),
];

/// Content report first (it is the only one with per-video rows), then one
/// table-data route per breakdown, then the chart-data series of the
/// date-filterable breakdowns.
fn routes() -> Vec<Route<Handler>> {
    let mut routes = vec![
        Route {
            name: "videos",
            matcher: Matcher::any(CONTENT)
                .requiring(TABLE_DATA)
                .excluding(CONTENT_TYPE),
            handler: Handler::Videos,
        },
        Route {
            name: "daily_totals",
            matcher: Matcher::any(CONTENT).requiring(TOTALS).excluding(CONTENT_TYPE),
            handler: Handler::DailyTotals,
        },
    ];

    for (kind, keywords) in BREAKDOWNS {
        routes.push(Route {
            name: kind.as_str(),
            matcher: Matcher::any(keywords).requiring(TABLE_DATA),
            handler: Handler::Breakdown(kind),
        });
    }
    for (kind, keywords) in BREAKDOWNS {
        if kind.is_date_filterable() {
            routes.push(Route {
                name: series_route_name(kind),
                matcher: Matcher::any(keywords).requiring(CHART_DATA),
                handler: Handler::Series(kind),
            });
        }
    }

    routes
}

fn series_route_name(kind: BreakdownKind) -> &'static str {
    match kind {
        BreakdownKind::DeviceTypes => "device_types_series",
        BreakdownKind::OperatingSystems => "operating_systems_series",
        BreakdownKind::TrafficSources => "traffic_sources_series",
        BreakdownKind::Countries => "countries_series",
        BreakdownKind::Cities => "cities_series",
        _ => "series",
    }
}

pub(super) fn import(entries: &[Entry], diagnostics: &mut ImportDiagnostics) -> ProcessedData {
    let routes = routes();
    let mut data = ProcessedData::default();
    let mut totals_seen = false;

    for entry in entries {
        let Some(route) = find_route(&routes, &entry.folded) else {
            diagnostics.unrecognized(&entry.name);
            continue;
        };
        let table = parse_table(&entry.text, TabularOptions::NORMALIZED);
        let stats = &mut diagnostics.coercion;

        let rows = match route.handler {
            Handler::Videos => {
                let videos = normalize::normalize_videos(&table, stats);
                let rows = videos.len();
                data.videos.extend(videos);
                rows
            }
            Handler::DailyTotals => {
                if totals_seen {
                    diagnostics.unrecognized(&entry.name);
                    continue;
                }
                totals_seen = true;
                data.daily_totals = normalize::normalize_daily_totals(&table, stats);
                data.daily_totals.len()
            }
            Handler::Breakdown(kind) => {
                let records = normalize::normalize_breakdown(kind, &table, stats);
                let rows = records.len();
                data.breakdown_mut(kind).extend(records);
                rows
            }
            Handler::Series(kind) => {
                let points = normalize::normalize_breakdown_series(kind, &table, stats);
                let rows = points.len();
                data.series.entry(kind).or_default().extend(points);
                rows
            }
        };
        diagnostics.routed(&entry.name, route.name, rows);
    }

    data.recompute_summary();
    data
}
