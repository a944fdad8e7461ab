use super::{find_route, Entry, ImportDiagnostics, Matcher, Route};
use crate::model::TikTokData;
use crate::normalize::tiktok as normalize;
use crate::tabular::{parse_table, TabularOptions};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Handler {
    Overview,
    Followers,
    Posts,
}

const ROUTES: &[Route<Handler>] = &[
    Route {
        name: "overview",
        matcher: Matcher::any(&["overview", "visao geral"]),
        handler: Handler::Overview,
    },
    Route {
        name: "followers",
        matcher: Matcher::any(&["follower", "seguidores"]),
        handler: Handler::Followers,
    },
    Route {
        name: "posts",
        matcher: Matcher::any(&["content", "conteudo"]),
        handler: Handler::Posts,
    },
];

pub(super) fn import(entries: &[Entry], diagnostics: &mut ImportDiagnostics) -> TikTokData {
    let mut data = TikTokData::default();

    for entry in entries {
        let table = parse_table(&entry.text, TabularOptions::RAW);
        let stats = &mut diagnostics.coercion;

        let (name, rows) = match find_route(ROUTES, &entry.folded).map(|r| (r.name, r.handler)) {
            Some((name, Handler::Overview)) => {
                let before = data.visualizacoes.len();
                normalize::normalize_overview(&table, &mut data, stats);
                (name, data.visualizacoes.len() - before)
            }
            Some((name, Handler::Followers)) => {
                let before = data.seguidores.len();
                normalize::normalize_followers(&table, &mut data, stats);
                (name, data.seguidores.len() - before)
            }
            Some((name, Handler::Posts)) => {
                let posts = normalize::normalize_posts(&table, stats);
                let rows = posts.len();
                data.posts.extend(posts);
                (name, rows)
            }
            None if normalize::looks_like_posts(&table) => {
                let posts = normalize::normalize_posts(&table, stats);
                let rows = posts.len();
                data.posts.extend(posts);
                ("posts", rows)
            }
            None => {
                diagnostics.unrecognized(&entry.name);
                continue;
            }
        };
        diagnostics.routed(&entry.name, name, rows);
    }

    data.recompute_resumo();
    data
}
