//! API Service - local dashboard data for imported analytics exports
//!
//! Holds the last imported aggregate of each platform in memory and serves
//! filtered views of it. The stored originals are never modified by a view.
//!
//! Endpoints:
//! - GET    /health - Health check
//! - POST   /import/:network - Import a ZIP export (body), optional ?save_as=
//! - GET    /data/:network - Filtered aggregate (?range= or ?start=&end=)
//! - GET    /diagnostics/:network - Diagnostics of the last import
//! - GET    /compare - Comparison projections of the loaded platforms
//! - GET    /export/:network - Export document as a download
//! - DELETE /data - Discard everything (logout)

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use backend::{open_store, AnalysisStore, AnalysisSummary, Config};
use ingest::{
    best_performer, filter_aggregate, import_archive, Aggregate, ComparisonField, DateRange,
    ExportDocument, ImportDiagnostics, Imported, IngestError, Network, PlatformComparison,
};

/// Upper bound for an uploaded export archive.
const IMPORT_BODY_LIMIT: usize = 256 * 1024 * 1024;

// ============================================================================
// State
// ============================================================================

struct Loaded {
    aggregate: Aggregate,
    diagnostics: ImportDiagnostics,
}

struct AppState {
    loaded: RwLock<BTreeMap<Network, Loaded>>,
    store: Option<Arc<dyn AnalysisStore>>,
}

impl AppState {
    fn new(store: Option<Arc<dyn AnalysisStore>>) -> Self {
        Self {
            loaded: RwLock::new(BTreeMap::new()),
            store,
        }
    }

    /// Replaces the platform's aggregate wholesale.
    async fn install(&self, imported: Imported) {
        let network = imported.aggregate.network();
        self.loaded.write().await.insert(
            network,
            Loaded {
                aggregate: imported.aggregate,
                diagnostics: imported.diagnostics,
            },
        );
    }

    async fn view(&self, network: Network, range: DateRange) -> Option<Aggregate> {
        self.loaded
            .read()
            .await
            .get(&network)
            .map(|loaded| filter_aggregate(&loaded.aggregate, range))
    }

    async fn diagnostics(&self, network: Network) -> Option<ImportDiagnostics> {
        self.loaded
            .read()
            .await
            .get(&network)
            .map(|loaded| loaded.diagnostics.clone())
    }

    async fn comparisons(&self, range: DateRange) -> Vec<PlatformComparison> {
        self.loaded
            .read()
            .await
            .values()
            .map(|loaded| PlatformComparison::from_aggregate(&filter_aggregate(&loaded.aggregate, range)))
            .collect()
    }

    async fn networks(&self) -> Vec<Network> {
        self.loaded.read().await.keys().copied().collect()
    }

    async fn clear(&self) {
        self.loaded.write().await.clear();
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
    loaded: Vec<Network>,
    store: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponse {
    network: Network,
    recognized: usize,
    comparison: PlatformComparison,
    saved: Option<AnalysisSummary>,
    diagnostics: ImportDiagnostics,
}

#[derive(Serialize)]
struct DataResponse {
    network: Network,
    range: String,
    data: Aggregate,
}

#[derive(Serialize)]
struct CompareResponse {
    range: String,
    platforms: Vec<PlatformComparison>,
    best: BTreeMap<&'static str, Option<Network>>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Query params
// ============================================================================

#[derive(Deserialize)]
struct ImportQuery {
    save_as: Option<String>,
}

#[derive(Deserialize, Default)]
struct RangeQuery {
    range: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl RangeQuery {
    fn resolve(&self) -> Result<DateRange, IngestError> {
        match (&self.range, self.start, self.end) {
            (None, None, None) => Ok(DateRange::All),
            (Some(range), None, None) => range.parse(),
            (None, Some(start), Some(end)) => DateRange::between(start, end),
            _ => Err(IngestError::InvalidRange {
                input: self.range.clone().unwrap_or_default(),
                reason: "use either range or both start and end".to_string(),
            }),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn ingest_status(err: &IngestError) -> StatusCode {
    match err {
        IngestError::NoValidFiles { .. } | IngestError::Zip(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IngestError::UnknownNetwork(_) | IngestError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn parse_network(raw: &str) -> Result<Network, Response> {
    raw.parse::<Network>()
        .map_err(|e| error_response(ingest_status(&e), e))
}

fn not_loaded(network: Network) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("No {network} data imported"),
    )
}

/// Saving never fails an import; errors are only logged.
async fn save_best_effort(
    store: &dyn AnalysisStore,
    network: Network,
    name: &str,
    aggregate: &Aggregate,
) -> Option<AnalysisSummary> {
    match store.create_analysis(network, name, aggregate).await {
        Ok(saved) => {
            info!(network = network.as_str(), id = %saved.id, "analysis saved");
            Some(saved)
        }
        Err(e) => {
            warn!(network = network.as_str(), name, error = %e, "failed to save analysis");
            None
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        loaded: state.networks().await,
        store: state.store.is_some(),
    })
}

async fn import_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_network): Path<String>,
    Query(params): Query<ImportQuery>,
    body: Bytes,
) -> Response {
    let network = match parse_network(&raw_network) {
        Ok(network) => network,
        Err(response) => return response,
    };

    let size = body.len();
    let imported = match tokio::task::spawn_blocking(move || import_archive(&body, network)).await
    {
        Ok(Ok(imported)) => imported,
        Ok(Err(e)) => {
            warn!(network = network.as_str(), size, error = %e, "import rejected");
            return error_response(ingest_status(&e), e);
        }
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("import task failed: {e}"),
            )
        }
    };

    let saved = match (&params.save_as, &state.store) {
        (Some(name), Some(store)) => {
            save_best_effort(store.as_ref(), network, name, &imported.aggregate).await
        }
        _ => None,
    };

    let response = ImportResponse {
        network,
        recognized: imported.diagnostics.recognized(),
        comparison: PlatformComparison::from_aggregate(&imported.aggregate),
        saved,
        diagnostics: imported.diagnostics.clone(),
    };
    info!(
        network = network.as_str(),
        size,
        recognized = response.recognized,
        "archive imported"
    );
    state.install(imported).await;

    Json(response).into_response()
}

async fn data_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_network): Path<String>,
    Query(params): Query<RangeQuery>,
) -> Response {
    let network = match parse_network(&raw_network) {
        Ok(network) => network,
        Err(response) => return response,
    };
    let range = match params.resolve() {
        Ok(range) => range,
        Err(e) => return error_response(ingest_status(&e), e),
    };

    match state.view(network, range).await {
        Some(data) => Json(DataResponse {
            network,
            range: range.to_string(),
            data,
        })
        .into_response(),
        None => not_loaded(network),
    }
}

async fn diagnostics_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_network): Path<String>,
) -> Response {
    let network = match parse_network(&raw_network) {
        Ok(network) => network,
        Err(response) => return response,
    };

    match state.diagnostics(network).await {
        Some(diagnostics) => Json(diagnostics).into_response(),
        None => not_loaded(network),
    }
}

async fn compare_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeQuery>,
) -> Response {
    let range = match params.resolve() {
        Ok(range) => range,
        Err(e) => return error_response(ingest_status(&e), e),
    };

    let platforms = state.comparisons(range).await;
    let best = ComparisonField::ALL
        .iter()
        .map(|field| (field.as_str(), best_performer(&platforms, *field)))
        .collect();

    Json(CompareResponse {
        range: range.to_string(),
        platforms,
        best,
    })
    .into_response()
}

async fn export_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_network): Path<String>,
    Query(params): Query<RangeQuery>,
) -> Response {
    let network = match parse_network(&raw_network) {
        Ok(network) => network,
        Err(response) => return response,
    };
    let range = match params.resolve() {
        Ok(range) => range,
        Err(e) => return error_response(ingest_status(&e), e),
    };
    let Some(data) = state.view(network, range).await else {
        return not_loaded(network);
    };

    let document = ExportDocument::new(data);
    let json = match document.to_json_pretty() {
        Ok(json) => json,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    };
    let disposition = format!("attachment; filename=\"{}\"", document.file_name());

    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        json,
    )
        .into_response()
}

async fn clear_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.clear().await;
    info!("all platform data discarded");
    StatusCode::NO_CONTENT
}

fn router(state: Arc<AppState>) -> Router {
    // CORS for the web frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/import/:network", post(import_handler))
        .route("/data/:network", get(data_handler))
        .route("/data", delete(clear_handler))
        .route("/diagnostics/:network", get(diagnostics_handler))
        .route("/compare", get(compare_handler))
        .route("/export/:network", get(export_handler))
        .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("Invalid backend configuration")?;
    let bind = std::env::var("API_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    println!("=== Analytics Dashboard API ===");

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "analysis store unavailable, saving disabled");
            None
        }
    };
    if store.is_some() {
        println!("Analysis store connected; ?save_as= saves imports");
    } else {
        println!("No analysis store configured; imports stay in memory");
    }

    let app = router(Arc::new(AppState::new(store)));

    println!("API listening on http://{}", bind);
    println!("\nEndpoints:");
    println!("  GET    /health");
    println!("  POST   /import/:network?save_as=");
    println!("  GET    /data/:network?range=|start=&end=");
    println!("  GET    /diagnostics/:network");
    println!("  GET    /compare?range=");
    println!("  GET    /export/:network?range=");
    println!("  DELETE /data");

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
