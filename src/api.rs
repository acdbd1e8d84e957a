// 🌐 REST API - Read-only catalog access over HTTP (feature "server")
//
// Every handler works on one snapshot taken at the start of the request, so a
// concurrent reload never produces a half-old, half-new response.

use crate::catalog::{CatalogSnapshot, CatalogStore};
use crate::data_quality::SourceStats;
use crate::filter::{filter_catalog, FilterQuery, FilterSpec};
use crate::record::CanonicalRecord;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CatalogStore>,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

/// Run metadata shared by catalog and reload responses
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub run_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub total_records: usize,
    pub failed_sources: usize,
    pub errors: &'a [String],
    pub stats: &'a [SourceStats],
}

impl<'a> From<&'a CatalogSnapshot> for RunSummary<'a> {
    fn from(snapshot: &'a CatalogSnapshot) -> Self {
        RunSummary {
            run_id: snapshot.run_id,
            loaded_at: snapshot.loaded_at,
            total_records: snapshot.len(),
            failed_sources: snapshot.failed_source_count(),
            errors: &snapshot.errors,
            stats: &snapshot.stats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse<'a> {
    #[serde(flatten)]
    pub run: RunSummary<'a>,
    pub records: &'a [CanonicalRecord],
}

#[derive(Debug, Serialize)]
pub struct FilterResponse<'a> {
    pub filter: FilterSpec,
    pub total_records: usize,
    pub matched: usize,
    pub records: Vec<&'a CanonicalRecord>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/catalog - Whole current catalog plus its errors
async fn get_catalog(State(state): State<AppState>) -> Response {
    let snapshot = state.store.snapshot();
    let response = CatalogResponse {
        run: RunSummary::from(snapshot.as_ref()),
        records: &snapshot.records,
    };
    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/catalog/filter - Dataset and range filtering
async fn filter_records(State(state): State<AppState>, Query(query): Query<FilterQuery>) -> Response {
    let spec = match query.to_spec() {
        Ok(spec) => spec,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let snapshot = state.store.snapshot();
    let records = filter_catalog(&snapshot.records, &spec);
    let response = FilterResponse {
        filter: spec,
        total_records: snapshot.len(),
        matched: records.len(),
        records,
    };
    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/catalog/records/:id - One record by id
async fn get_record(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id: u32 = match id.trim().parse() {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, format!("invalid record id '{id}'")),
    };

    let snapshot = state.store.snapshot();
    match snapshot.record(id) {
        Some(record) => (StatusCode::OK, Json(ApiResponse::ok(record))).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("no record with id {id}")),
    }
}

/// GET /api/sources - Per-source diagnostics of the current catalog
async fn get_sources(State(state): State<AppState>) -> Response {
    let snapshot = state.store.snapshot();
    (StatusCode::OK, Json(ApiResponse::ok(&snapshot.stats))).into_response()
}

/// POST /api/catalog/reload - Rebuild the catalog from every source
async fn reload_catalog(State(state): State<AppState>) -> Response {
    let handle = state.store.spawn_reload();
    match handle.wait().await {
        Some(snapshot) => {
            if let Some(summary) = snapshot.error_summary() {
                warn!("reload finished with errors: {}", summary);
            }
            (StatusCode::OK, Json(ApiResponse::ok(RunSummary::from(snapshot.as_ref())))).into_response()
        }
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "reload was cancelled"),
    }
}

// ============================================================================
// Router
// ============================================================================

/// `/api/...` routes over `store`, with permissive CORS
pub fn router(store: Arc<CatalogStore>) -> Router {
    let state = AppState { store };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/catalog", get(get_catalog))
        .route("/catalog/filter", get(filter_records))
        .route("/catalog/records/:id", get(get_record))
        .route("/catalog/reload", post(reload_catalog))
        .route("/sources", get(get_sources))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogLoader, CatalogSource};
    use crate::fetch::StaticFetcher;
    use crate::parser::SourceType;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    const KEPLER_CSV: &str = "\
kepid,kepoi_name,kepler_name,koi_disposition,koi_period,koi_prad,koi_teq
10797460,K00752.01,Kepler-227 b,CONFIRMED,9.488,2.26,793
10854555,K00755.01,,CANDIDATE,2.525,0.86,1406
6521045,K00115.01,Kepler-105 b,CONFIRMED,5.412,,1015
";

    const K2_CSV: &str = "\
pl_name,hostname,disposition,pl_orbper,pl_rade,pl_eqt
K2-18 b,K2-18,CONFIRMED,32.94,2.61,255
K2-3 d,K2-3,CANDIDATE,44.56,1.64,282
";

    // TESS is unreachable in every test app
    async fn test_app() -> (Router, Arc<CatalogStore>) {
        let fetcher = StaticFetcher::new()
            .with_body("koi.csv", KEPLER_CSV)
            .with_body("k2.csv", K2_CSV)
            .with_failure("toi.csv", "connection refused");

        let sources = vec![
            CatalogSource::new(SourceType::Kepler, "koi.csv"),
            CatalogSource::new(SourceType::K2, "k2.csv"),
            CatalogSource::new(SourceType::Tess, "toi.csv"),
        ];
        let store = Arc::new(CatalogStore::new(sources, CatalogLoader::new(Arc::new(fetcher))));
        store.reload().await;
        (router(Arc::clone(&store)), store)
    }

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app().await;
        let (status, body) = call(app, Method::GET, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_catalog_includes_records_and_source_errors() {
        let (app, _) = test_app().await;
        let (status, body) = call(app, Method::GET, "/api/catalog").await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["total_records"], 4);
        assert_eq!(data["failed_sources"], 1);
        assert_eq!(data["errors"].as_array().unwrap().len(), 1);
        assert!(data["errors"][0].as_str().unwrap().contains("TESS"));

        let records = data["records"].as_array().unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(records[0]["source"], "Kepler");
        assert_eq!(records[2]["disposition"], "CONFIRMED");
    }

    #[tokio::test]
    async fn test_filter_by_dataset_and_radius() {
        let (app, _) = test_app().await;
        let (status, body) =
            call(app, Method::GET, "/api/catalog/filter?dataset=K2&min_radius=2.0&max_period=").await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["matched"], 1);
        assert_eq!(data["total_records"], 4);
        assert_eq!(data["records"][0]["name"], "K2-18 b");
        assert_eq!(data["filter"]["dataset"], "K2");
    }

    #[tokio::test]
    async fn test_filter_garbage_bound_is_ignored() {
        let (app, _) = test_app().await;
        let (status, body) = call(app, Method::GET, "/api/catalog/filter?max_radius=abc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["matched"], 4);
    }

    #[tokio::test]
    async fn test_filter_unknown_dataset_is_bad_request() {
        let (app, _) = test_app().await;
        let (status, body) = call(app, Method::GET, "/api/catalog/filter?dataset=Gaia").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Gaia"));
    }

    #[tokio::test]
    async fn test_record_lookup() {
        let (app, _) = test_app().await;

        let (status, body) = call(app.clone(), Method::GET, "/api/catalog/records/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "K2-18 b");

        let (status, body) = call(app, Method::GET, "/api/catalog/records/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_record_lookup_with_non_numeric_id() {
        let (app, _) = test_app().await;

        let (status, body) = call(app.clone(), Method::GET, "/api/catalog/records/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("abc"));

        let (status, _) = call(app, Method::GET, "/api/catalog/records/-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sources_stats() {
        let (app, _) = test_app().await;
        let (status, body) = call(app, Method::GET, "/api/sources").await;

        assert_eq!(status, StatusCode::OK);
        let stats = body["data"].as_array().unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0]["source"], "Kepler");
        assert_eq!(stats[0]["rows_read"], 3);
        assert_eq!(stats[0]["accepted"], 2);
        assert_eq!(stats[0]["rejected"], 1);
        assert!(stats[2]["error"].is_string());
    }

    #[tokio::test]
    async fn test_reload_publishes_new_run() {
        let (app, store) = test_app().await;
        let before = store.snapshot().run_id;

        let (status, body) = call(app, Method::POST, "/api/catalog/reload").await;

        assert_eq!(status, StatusCode::OK);
        assert_ne!(store.snapshot().run_id, before);
        assert_eq!(body["data"]["run_id"], store.snapshot().run_id.to_string());
        assert_eq!(body["data"]["total_records"], 4);
    }
}
