use super::{find_route, Entry, ImportDiagnostics, Matcher, Route, PREVIEW_CHARS};
use crate::audience::{parse_audience, Section};
use crate::model::{InstagramData, MetricPoint};
use crate::normalize::instagram as normalize;
use crate::tabular::{parse_table, strip_title_line, TabularOptions};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Handler {
    Audience,
    Metric(Metric),
}

/// The single-metric daily files.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Metric {
    Visualizacoes,
    Alcance,
    Seguidores,
    Interacoes,
    Visitas,
    CliquesLink,
}

impl Metric {
    fn series_mut(self, data: &mut InstagramData) -> &mut Vec<MetricPoint> {
        match self {
            Metric::Visualizacoes => &mut data.visualizacoes,
            Metric::Alcance => &mut data.alcance,
            Metric::Seguidores => &mut data.seguidores,
            Metric::Interacoes => &mut data.interacoes,
            Metric::Visitas => &mut data.visitas,
            Metric::CliquesLink => &mut data.cliques_link,
        }
    }
}

const ROUTES: &[Route<Handler>] = &[
    Route {
        name: "audience",
        matcher: Matcher::any(&["publico", "audience"]),
        handler: Handler::Audience,
    },
    Route {
        name: "link_clicks",
        matcher: Matcher::any(&["cliques no link", "link clicks"]),
        handler: Handler::Metric(Metric::CliquesLink),
    },
    Route {
        name: "views",
        matcher: Matcher::any(&["visualizacoes", "views"]),
        handler: Handler::Metric(Metric::Visualizacoes),
    },
    Route {
        name: "reach",
        matcher: Matcher::any(&["alcance", "reach"]),
        handler: Handler::Metric(Metric::Alcance),
    },
    Route {
        name: "followers",
        matcher: Matcher::any(&["seguidores", "followers", "follows"]),
        handler: Handler::Metric(Metric::Seguidores),
    },
    Route {
        name: "interactions",
        matcher: Matcher::any(&["interacoes", "interactions"]),
        handler: Handler::Metric(Metric::Interacoes),
    },
    Route {
        name: "visits",
        matcher: Matcher::any(&["visitas", "visits"]),
        handler: Handler::Metric(Metric::Visitas),
    },
];

fn audience_file(entry: &Entry, data: &mut InstagramData, diagnostics: &mut ImportDiagnostics) -> usize {
    let report = parse_audience(&entry.text);

    for section in &report.sections_found {
        if !diagnostics.sections_found.contains(section) {
            diagnostics.sections_found.push(*section);
        }
    }
    for (section, count) in [
        (Section::Age, report.idade_genero.len()),
        (Section::Cities, report.cidades.len()),
        (Section::Countries, report.paises.len()),
        (Section::Pages, report.paginas.len()),
    ] {
        *diagnostics
            .section_counts
            .entry(section.as_str().to_string())
            .or_default() += count;
    }
    for unpaired in &report.unpaired {
        diagnostics.errors.push(format!(
            "{}: {} names without values ({})",
            entry.name,
            unpaired.section.as_str(),
            unpaired.names.join(", ")
        ));
    }
    diagnostics
        .errors
        .extend(report.errors.iter().map(|e| format!("{}: {e}", entry.name)));
    if diagnostics.audience_preview.is_none() {
        diagnostics.audience_preview = Some(entry.text.chars().take(PREVIEW_CHARS).collect());
    }

    let rows = report.idade_genero.len()
        + report.cidades.len()
        + report.paises.len()
        + report.paginas.len();
    data.publico_idade_genero.extend(report.idade_genero);
    data.publico_cidades.extend(report.cidades);
    data.publico_paises.extend(report.paises);
    data.publico_paginas.extend(report.paginas);
    rows
}

pub(super) fn import(entries: &[Entry], diagnostics: &mut ImportDiagnostics) -> InstagramData {
    let mut data = InstagramData::default();

    for entry in entries {
        match find_route(ROUTES, &entry.folded) {
            Some(route) => {
                let rows = match route.handler {
                    Handler::Audience => audience_file(entry, &mut data, diagnostics),
                    Handler::Metric(metric) => {
                        let table = parse_table(strip_title_line(&entry.text), TabularOptions::RAW);
                        let points = normalize::normalize_metric_series(&table, &mut diagnostics.coercion);
                        let rows = points.len();
                        metric.series_mut(&mut data).extend(points);
                        rows
                    }
                };
                diagnostics.routed(&entry.name, route.name, rows);
            }
            None => {
                let table = parse_table(&entry.text, TabularOptions::RAW);
                if normalize::looks_like_posts(&table) {
                    let posts = normalize::normalize_posts(&table, &mut diagnostics.coercion);
                    diagnostics.routed(&entry.name, "posts", posts.len());
                    data.posts.extend(posts);
                } else {
                    diagnostics.unrecognized(&entry.name);
                }
            }
        }
    }

    data.recompute_resumo();
    data
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::zip_archive;
    use super::super::import_archive;
    use super::*;
    use crate::model::{AgeGenderShare, Aggregate, Network};

    fn import(files: &[(&str, &[u8])]) -> (InstagramData, ImportDiagnostics) {
        let imported = import_archive(&zip_archive(files), Network::Instagram).unwrap();
        match imported.aggregate {
            Aggregate::Instagram(data) => (data, imported.diagnostics),
            other => panic!("unexpected aggregate {:?}", other.network()),
        }
    }

    #[test]
    fn test_views_and_audience_end_to_end() {
        let (data, diagnostics) = import(&[
            (
                "Visualizações.csv",
                "Data,Valor\n2024-01-01,100\n2024-01-02,200\n".as_bytes(),
            ),
            (
                "Público.csv",
                "Faixa etária e gênero\n\"18-24\",10,5\n".as_bytes(),
            ),
        ]);

        assert_eq!(data.resumo.total_visualizacoes, 300.0);
        assert_eq!(
            data.publico_idade_genero,
            vec![AgeGenderShare {
                categoria: "18-24".to_string(),
                valor_mulheres: 10.0,
                valor_homens: 5.0,
                porcentagem: 15.0,
            }]
        );
        assert_eq!(diagnostics.sections_found, vec![Section::Age]);
        assert_eq!(diagnostics.section_counts["age"], 1);
        assert!(diagnostics
            .audience_preview
            .as_deref()
            .unwrap()
            .starts_with("Faixa"));
    }

    #[test]
    fn test_meta_metric_preamble() {
        let (data, _) = import(&[(
            "export/Alcance.csv",
            "sep=,\n\"Alcance\"\n\"Data\",\"Primary\"\n\"2024-01-01\",\"7\"\n\"2024-01-02\",\"3\"\n"
                .as_bytes(),
        )]);
        assert_eq!(data.alcance.len(), 2);
        assert_eq!(data.resumo.total_alcance, 10.0);
    }

    #[test]
    fn test_each_metric_file_fills_its_series() {
        let csv: &[u8] = b"Data,Valor\n2024-01-01,1\n";
        let (data, diagnostics) = import(&[
            ("Seguidores.csv", csv),
            ("Interações.csv", csv),
            ("Visitas.csv", csv),
            ("Cliques no link.csv", csv),
        ]);
        assert_eq!(data.resumo.novos_seguidores, 1.0);
        assert_eq!(data.resumo.total_interacoes, 1.0);
        assert_eq!(data.resumo.total_visitas, 1.0);
        assert_eq!(data.resumo.total_cliques_link, 1.0);
        assert!(data.visualizacoes.is_empty());
        assert_eq!(diagnostics.recognized(), 4);
    }

    #[test]
    fn test_unmatched_post_export_is_probed() {
        let (data, diagnostics) = import(&[(
            "Jan-01-2024_Jan-31-2024_123.csv",
            "Identificação do post,Horário de publicação,Curtidas,Salvamentos\n1790,01/15/2024 10:00,12,3\n"
                .as_bytes(),
        )]);
        assert_eq!(data.posts.len(), 1);
        assert_eq!(data.resumo.total_posts, 1);
        assert_eq!(data.total_saves(), 3.0);
        assert_eq!(diagnostics.files[0].route.as_deref(), Some("posts"));
    }

    #[test]
    fn test_audience_problems_reach_diagnostics() {
        let (_, diagnostics) = import(&[(
            "Público.csv",
            "Faixa etária\nTotal,1,1\nPrincipais cidades\nLisboa,Porto\n".as_bytes(),
        )]);
        assert_eq!(diagnostics.errors.len(), 2);
        assert_eq!(diagnostics.sections_found, vec![Section::Age, Section::Cities]);
    }

    #[test]
    fn test_windows_1252_entry_body() {
        // 0xE9 is "é" in Windows-1252 and invalid as UTF-8.
        let (data, _) = import(&[("Alcance.csv", b"Data,Valor\n2024-01-01,4\n\xe9,1\n")]);
        assert_eq!(data.alcance.len(), 2);
        assert_eq!(data.alcance[1].data, "é");
    }
}
