use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::constants;
use crate::ingest;
use crate::normalize::normalize;
use crate::query;
use crate::registry;
use crate::snapshot::SnapshotHandle;
use crate::types::Grupo;

/// Shared state: the published snapshot plus the config needed by the
/// admin reload trigger.
pub struct AppState {
    pub snapshots: SnapshotHandle,
    pub config: Config,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "rajai-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn root() -> impl IntoResponse {
    Json(json!({ "status": "API RAJAI is running" }))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    q: Option<String>,
    bairro: Option<String>,
    grupo: Option<String>,
    categoria: Option<String>,
    #[serde(default)]
    offset: i64,
    #[serde(default)]
    limit: i64,
}

/// Paginated, filterable raw-row listing for one dataset table.
async fn list_dataset(
    Extension(state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let snapshot = state.snapshots.current();
    let rows = match query::dataset_rows(&snapshot, &slug) {
        Ok(rows) => rows,
        Err(e) => return not_found(&e.to_string()),
    };

    let mut filters: BTreeMap<String, String> = BTreeMap::new();
    if let Some(bairro) = &params.bairro {
        filters.insert("bairro".to_string(), normalize(bairro));
    }
    if let Some(grupo) = &params.grupo {
        filters.insert("classificacao_grupo".to_string(), grupo.clone());
    }
    if let Some(categoria) = &params.categoria {
        filters.insert("classificacao_cnae".to_string(), categoria.clone());
    }

    let page = query::filter_rows(
        rows,
        params.q.as_deref(),
        &filters,
        params.offset,
        params.limit,
    );

    Json(json!({
        "meta": {
            "dataset": slug,
            "total": page.total,
            "offset": params.offset.max(0),
            "limit": params.limit.max(0),
        },
        "data": page.rows,
    }))
    .into_response()
}

/// Per-dataset numeric summary: sum of every coercible field.
async fn dataset_summary(
    Extension(state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let snapshot = state.snapshots.current();
    let rows = match query::dataset_rows(&snapshot, &slug) {
        Ok(rows) => rows,
        Err(e) => return not_found(&e.to_string()),
    };
    let somas = query::summarize_numeric(rows);

    Json(json!({ "dataset": slug, "somas": somas })).into_response()
}

/// Dataset registry plus the metric/group vocabulary for map clients.
async fn catalogo(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshots.current();
    let datasets: Vec<_> = registry::DATASETS
        .iter()
        .map(|d| {
            json!({
                "slug": d.slug,
                "categoria": d.categoria,
                "rotulo": d.rotulo,
                "grupo": d.grupo.as_label(),
            })
        })
        .collect();

    Json(json!({
        "datasets": datasets,
        "grupos": snapshot.catalog.grupos,
        "metrics": snapshot.catalog.metrics,
    }))
}

#[derive(Debug, Deserialize)]
struct ChoroplethParams {
    metric: Option<String>,
}

/// Ordered {bairro, value} series for one recognized metric.
async fn choropleth(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ChoroplethParams>,
) -> impl IntoResponse {
    let metric = params
        .metric
        .unwrap_or_else(|| constants::DEFAULT_CHOROPLETH_METRIC.to_string());
    if !constants::is_known_metric(&metric) {
        return bad_request(&format!("Métrica desconhecida: {}", metric));
    }

    let snapshot = state.snapshots.current();
    let data: Vec<_> = snapshot
        .summaries
        .values()
        .filter_map(|s| {
            s.metrics
                .get(&metric)
                .map(|v| json!({ "bairro": s.bairro, "value": v }))
        })
        .collect();

    Json(json!({
        "meta": { "metric": metric, "geo_join_key": "bairro_norm" },
        "data": data,
    }))
    .into_response()
}

/// Per-neighborhood tooltip payload.
async fn tooltip(
    Extension(state): Extension<Arc<AppState>>,
    Path(bairro): Path<String>,
) -> impl IntoResponse {
    let key = normalize(&bairro);
    let snapshot = state.snapshots.current();
    let summary = match query::summary_for(&snapshot, &key) {
        Ok(s) => s,
        Err(e) => return not_found(&e.to_string()),
    };

    let mut totais = serde_json::Map::new();
    for metric in constants::METRICS {
        // Undefined densities (no joined population) render as 0 here
        let value = query::metric_value(summary, metric).unwrap_or(0.0);
        totais.insert(metric.to_string(), json!(value));
    }
    for (metric, percentil) in &summary.percentis {
        totais.insert(format!("percentil_{}", metric), json!(percentil));
    }

    let breakdown: serde_json::Map<String, serde_json::Value> = summary
        .breakdown
        .iter()
        .map(|(grupo, items)| (grupo.as_label().to_string(), json!(items)))
        .collect();

    Json(json!({
        "meta": { "bairro": summary.bairro },
        "populacao": summary.populacao,
        "area_km2": summary.area_km2,
        "totais": totais,
        "breakdown": breakdown,
    }))
    .into_response()
}

/// City-wide totals and percentage share per group.
async fn rollup(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshots.current();

    let mut per_grupo: BTreeMap<Grupo, i64> = BTreeMap::new();
    let mut total: i64 = 0;
    for summary in snapshot.summaries.values() {
        for (grupo, count) in &summary.group_totals {
            *per_grupo.entry(*grupo).or_insert(0) += count;
            total += count;
        }
    }

    let grupos: Vec<_> = per_grupo
        .iter()
        .map(|(grupo, count)| {
            let percentual = if total > 0 {
                ((*count as f64 / total as f64) * 10_000.0).round() / 100.0
            } else {
                0.0
            };
            json!({
                "grupo": grupo.as_label(),
                "total": count,
                "percentual": percentual,
            })
        })
        .collect();

    Json(json!({ "total": total, "grupos": grupos, "bairros": snapshot.summaries.len() }))
}

/// Rebuilds the snapshot from the configured sources and publishes it.
async fn reload(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match ingest::load_and_build(&state.config) {
        Ok(snapshot) => {
            let bairros = snapshot.summaries.len();
            state.snapshots.publish(snapshot);
            info!(bairros, "snapshot recarregado");
            Json(json!({ "recarregado": true, "bairros": bairros })).into_response()
        }
        Err(e) => {
            error!("reload failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn not_found(detail: &str) -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail }))).into_response()
}

fn bad_request(detail: &str) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
}

/// Create the HTTP server with all routes
pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/dados/:slug", get(list_dataset))
        .route("/api/v1/dados/:slug/resumo", get(dataset_summary))
        .route("/api/v1/geo/bairros/catalogo", get(catalogo))
        .route("/api/v1/geo/bairros/choropleth", get(choropleth))
        .route("/api/v1/geo/bairros/rollup", get(rollup))
        .route("/api/v1/geo/bairros/:bairro/tooltip", get(tooltip))
        .route("/admin/reload", post(reload))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    state: Arc<AppState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("🗺️  Catálogo:     http://localhost:{port}/api/v1/geo/bairros/catalogo");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
