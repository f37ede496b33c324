use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::header,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::ws::websocket_handler;
use crate::adapter::AdapterSnapshot;
use crate::error::ApiError;
use crate::export::{export_csv, export_json, visible_connections, Connection};
use crate::geo::{continent, estimate_latency, great_circle_km, Continent};
use crate::latency::{LatencyQuality, LatencyStats, ServerStatus};
use crate::middleware::request_logging;
use crate::models::{HistoricalSeries, LatencySnapshot, Provider, TimeRange};
use crate::radar::{NetflowsResponse, RadarProxy};
use crate::registry::{self, SearchResults};
use crate::state::{HistoricalSnapshot, LiveData};
use crate::store::{ViewPatch, ViewSettings, ViewStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub live: Arc<LiveData>,
    pub view: ViewStore,
    pub proxy: Arc<RadarProxy>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/radar/netflows", get(radar_netflows))
        .route("/api/locations", get(get_locations))
        .route("/api/search", get(search_locations))
        .route("/api/estimate", get(estimate_pair))
        .route("/api/latency", get(get_latency))
        .route("/api/latency/historical", get(get_historical))
        .route("/api/latency/live", get(get_live))
        .route("/api/connections", get(get_connections))
        .route("/api/stats", get(get_stats))
        .route("/api/view", get(get_view).post(update_view))
        .route("/api/export", get(export_data))
        .route("/ws", get(websocket_handler))
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ===== Query parameters =====

/// Which latency slice a derived view is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotSource {
    Simulated,
    Live,
}

impl SnapshotSource {
    fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw.map(str::trim) {
            None | Some("") | Some("simulated") => Ok(Self::Simulated),
            Some("live") => Ok(Self::Live),
            Some(other) => Err(ApiError::BadRequest(format!(
                "unknown source '{other}', expected 'simulated' or 'live'"
            ))),
        }
    }
}

impl AppState {
    fn snapshot_for(&self, source: SnapshotSource) -> LatencySnapshot {
        match source {
            SnapshotSource::Simulated => (*self.live.latency()).clone(),
            SnapshotSource::Live => self.live.adapter().current.clone(),
        }
    }

    fn historical_for(&self, source: SnapshotSource) -> HistoricalSeries {
        match source {
            SnapshotSource::Simulated => self.live.historical().series.clone(),
            SnapshotSource::Live => self.live.adapter().historical.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationsQuery {
    /// Comma-separated provider list; defaults to the view's visible providers
    providers: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionsQuery {
    source: Option<String>,
    #[serde(default)]
    arcs: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    source: Option<String>,
    exchange: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    format: Option<String>,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    exchange: String,
    region: String,
}

fn parse_providers(raw: &str) -> Result<Vec<Provider>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Provider>().map_err(ApiError::BadRequest))
        .collect()
}

fn parse_range(raw: &str) -> Result<TimeRange, ApiError> {
    raw.parse::<TimeRange>().map_err(ApiError::BadRequest)
}

// ===== Route Handlers =====

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// Always 200; failures are reported in the body
async fn radar_netflows(State(state): State<AppState>) -> Json<NetflowsResponse> {
    Json(state.proxy.netflows().await)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsResponse {
    pub providers: Vec<Provider>,
    pub exchanges: Vec<&'static crate::models::Exchange>,
    pub cloud_regions: Vec<&'static crate::models::CloudRegion>,
}

async fn get_locations(
    State(state): State<AppState>,
    query: Result<Query<LocationsQuery>, QueryRejection>,
) -> Result<Json<LocationsResponse>, ApiError> {
    let Query(params) = query?;
    let providers = match params.providers.as_deref() {
        Some(raw) => parse_providers(raw)?,
        None => state.view.snapshot().visible_provider_list(),
    };

    Ok(Json(LocationsResponse {
        exchanges: registry::exchanges_for(&providers),
        cloud_regions: registry::regions_for(&providers),
        providers,
    }))
}

async fn search_locations(
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResults>, ApiError> {
    let Query(params) = query?;
    Ok(Json(registry::search(&params.q)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub exchange_id: &'static str,
    pub region_id: &'static str,
    pub distance_km: f64,
    pub estimated_latency: f64,
    pub exchange_continent: Continent,
    pub region_continent: Continent,
}

/// Distance-based latency estimate for one pair
async fn estimate_pair(
    query: Result<Query<EstimateQuery>, QueryRejection>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let Query(params) = query?;
    let exchange = registry::exchange(&params.exchange)
        .ok_or_else(|| ApiError::NotFound(format!("Exchange {} not found", params.exchange)))?;
    let region = registry::region(&params.region)
        .ok_or_else(|| ApiError::NotFound(format!("Region {} not found", params.region)))?;

    let distance_km = great_circle_km(
        exchange.latitude,
        exchange.longitude,
        region.latitude,
        region.longitude,
    );
    let mut rng = StdRng::from_entropy();

    Ok(Json(EstimateResponse {
        exchange_id: exchange.id,
        region_id: region.id,
        distance_km,
        estimated_latency: estimate_latency(distance_km, &mut rng),
        exchange_continent: continent(exchange.latitude, exchange.longitude),
        region_continent: continent(region.latitude, region.longitude),
    }))
}

async fn get_latency(State(state): State<AppState>) -> Json<Arc<LatencySnapshot>> {
    Json(state.live.latency())
}

/// All ranges, or a single one with `?range=`
async fn get_historical(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let snapshot: Arc<HistoricalSnapshot> = state.live.historical();
    match params.range.as_deref() {
        None => Ok(Json(snapshot).into_response()),
        Some(raw) => {
            let range = parse_range(raw)?;
            let points = snapshot.series.get(&range).cloned().unwrap_or_default();
            Ok(Json(json!({
                "range": range,
                "points": points,
                "generatedAt": snapshot.generated_at,
            }))
            .into_response())
        }
    }
}

async fn get_live(State(state): State<AppState>) -> Json<Arc<AdapterSnapshot>> {
    Json(state.live.adapter())
}

#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    pub count: usize,
    pub connections: Vec<Connection>,
}

async fn get_connections(
    State(state): State<AppState>,
    query: Result<Query<ConnectionsQuery>, QueryRejection>,
) -> Result<Json<ConnectionsResponse>, ApiError> {
    let Query(params) = query?;
    let source = SnapshotSource::parse(params.source.as_deref())?;
    let snapshot = state.snapshot_for(source);
    let connections = visible_connections(&snapshot, &state.view.snapshot(), params.arcs);

    Ok(Json(ConnectionsResponse {
        count: connections.len(),
        connections,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: Provider,
    pub continent: Continent,
    pub stats: LatencyStats,
    pub quality: LatencyQuality,
    pub status: ServerStatus,
}

#[derive(Debug, Serialize)]
pub struct OverallSummary {
    #[serde(flatten)]
    pub stats: LatencyStats,
    pub status: ServerStatus,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub overall: OverallSummary,
    pub exchanges: Vec<ExchangeSummary>,
}

fn summarize(snapshot: &LatencySnapshot, exchange: &'static crate::models::Exchange) -> ExchangeSummary {
    let stats = LatencyStats::for_exchange(snapshot, exchange.id);
    ExchangeSummary {
        id: exchange.id,
        name: exchange.name,
        provider: exchange.provider,
        continent: continent(exchange.latitude, exchange.longitude),
        stats,
        quality: LatencyQuality::classify(stats.average),
        status: ServerStatus::from_average(stats.average),
    }
}

async fn get_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<StatsResponse>, ApiError> {
    let Query(params) = query?;
    let source = SnapshotSource::parse(params.source.as_deref())?;
    let snapshot = state.snapshot_for(source);

    let exchanges = match params.exchange.as_deref() {
        Some(id) => {
            let exchange = registry::exchange(id)
                .ok_or_else(|| ApiError::NotFound(format!("Exchange {id} not found")))?;
            vec![summarize(&snapshot, exchange)]
        }
        None => registry::exchanges()
            .iter()
            .map(|e| summarize(&snapshot, e))
            .collect(),
    };

    let overall = LatencyStats::from_snapshot(&snapshot);
    Ok(Json(StatsResponse {
        overall: OverallSummary {
            stats: overall,
            status: ServerStatus::from_average(overall.average),
        },
        exchanges,
    }))
}

async fn get_view(State(state): State<AppState>) -> Json<ViewSettings> {
    Json(state.view.snapshot())
}

async fn update_view(
    State(state): State<AppState>,
    payload: Result<Json<ViewPatch>, JsonRejection>,
) -> Result<Json<ViewSettings>, ApiError> {
    let Json(patch) = payload?;
    state
        .view
        .apply(patch)
        .map(Json)
        .map_err(ApiError::BadRequest)
}

async fn export_data(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let source = SnapshotSource::parse(params.source.as_deref())?;
    let snapshot = state.snapshot_for(source);
    let settings = state.view.snapshot();
    let stamp = Utc::now().timestamp_millis();

    match params.format.as_deref().unwrap_or("json") {
        "json" => {
            let doc = export_json(&snapshot, &state.historical_for(source), &settings);
            Ok((
                [(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"latency-data-{stamp}.json\""),
                )],
                Json(doc),
            )
                .into_response())
        }
        "csv" => Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"latency-report-{stamp}.csv\""),
                ),
            ],
            export_csv(&snapshot, &settings),
        )
            .into_response()),
        other => Err(ApiError::BadRequest(format!(
            "unknown export format '{other}', expected 'json' or 'csv'"
        ))),
    }
}
