use chrono::{DateTime, Local, Timelike, Utc};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::mapping::{enhanced_mock, map_series};
use super::source::NetflowSource;
use crate::error::AdapterError;
use crate::latency::{generate_series, LatencySimulator, SeriesProfile};
use crate::models::{DataSource, HistoricalSeries, LatencySnapshot};
use crate::radar::{series_values, NetflowsResponse};
use crate::registry;

/// Which branch produced the last adapter snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterMode {
    /// No credential; plain simulator output
    Mock,
    Live { endpoint: String },
    /// Proxy answered with its own synthetic payload
    ServerFallback,
    /// Proxy unreachable or unintelligible; local enhanced mock
    Error,
}

impl AdapterMode {
    fn name(&self) -> &'static str {
        match self {
            AdapterMode::Mock => "mock",
            AdapterMode::Live { .. } => "live",
            AdapterMode::ServerFallback => "server_fallback",
            AdapterMode::Error => "error",
        }
    }

    fn source(&self) -> DataSource {
        match self {
            AdapterMode::Mock => DataSource::Simulated,
            AdapterMode::Live { .. } => DataSource::Live,
            AdapterMode::ServerFallback => DataSource::ServerFallback,
            AdapterMode::Error => DataSource::EnhancedMock,
        }
    }
}

/// Result of one adapter cycle. Always populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterSnapshot {
    pub current: LatencySnapshot,
    pub historical: HistoricalSeries,
    pub error: Option<String>,
    pub has_api_key: bool,
    pub mode: AdapterMode,
    pub refreshed_at: DateTime<Utc>,
}

impl AdapterSnapshot {
    /// Placeholder published before the first cycle completes
    pub fn pending(has_api_key: bool) -> Self {
        Self {
            current: LatencySnapshot::empty(DataSource::Simulated),
            historical: HistoricalSeries::new(),
            error: None,
            has_api_key,
            mode: AdapterMode::Mock,
            refreshed_at: Utc::now(),
        }
    }
}

/// What a proxy response means for this cycle
enum Fetched {
    Live { endpoint: String, data: Value },
    Fallback { message: String, data: Value },
}

fn classify(response: NetflowsResponse) -> Result<Fetched, AdapterError> {
    let fallback = response.is_fallback();
    let data = response.data.filter(|d| !d.is_null());

    match (response.success, fallback, data) {
        (true, _, Some(data)) => Ok(Fetched::Live {
            endpoint: response.endpoint.unwrap_or_default(),
            data,
        }),
        (_, true, Some(data)) => Ok(Fetched::Fallback {
            message: response.message.unwrap_or_default(),
            data,
        }),
        (_, true, None) => Err(AdapterError::MalformedResponse(
            "fallback without data".into(),
        )),
        _ => Err(AdapterError::MalformedResponse(
            "neither success nor fallback".into(),
        )),
    }
}

/// Remote latency adapter
///
/// Without a credential it never touches the network and returns simulator
/// output. With one, it polls the radar proxy and degrades to synthetic data
/// on any failure. `refresh` never fails.
pub struct LatencyAdapter {
    source: Arc<dyn NetflowSource>,
    has_api_key: bool,
    simulator: LatencySimulator,
    exchanges: Vec<&'static str>,
    mapped_regions: Vec<&'static str>,
    mock_regions: Vec<&'static str>,
    rng: Mutex<ChaCha8Rng>,
    last_mode: Mutex<Option<&'static str>>,
}

impl LatencyAdapter {
    pub fn new(source: Arc<dyn NetflowSource>, has_api_key: bool) -> Self {
        Self::with_rng(source, has_api_key, ChaCha8Rng::from_entropy())
    }

    /// Deterministic draws, for tests
    pub fn with_seed(source: Arc<dyn NetflowSource>, has_api_key: bool, seed: u64) -> Self {
        Self::with_rng(source, has_api_key, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(source: Arc<dyn NetflowSource>, has_api_key: bool, rng: ChaCha8Rng) -> Self {
        Self {
            source,
            has_api_key,
            simulator: LatencySimulator::from_registry(),
            exchanges: registry::exchange_ids(),
            mapped_regions: registry::adapter_region_ids(),
            mock_regions: registry::region_ids(),
            rng: Mutex::new(rng),
            last_mode: Mutex::new(None),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.has_api_key
    }

    pub async fn refresh(&self) -> AdapterSnapshot {
        self.refresh_at(Local::now()).await
    }

    /// One adapter cycle evaluated at local time `now`
    pub async fn refresh_at(&self, now: DateTime<Local>) -> AdapterSnapshot {
        let snapshot = if !self.has_api_key {
            self.simulated(now)
        } else {
            match self.source.fetch().await.and_then(classify) {
                Ok(Fetched::Live { endpoint, data }) => {
                    self.mapped(now, &data, AdapterMode::Live { endpoint }, None)
                }
                Ok(Fetched::Fallback { message, data }) => {
                    let error = AdapterError::UpstreamUnavailable(message);
                    self.mapped(now, &data, AdapterMode::ServerFallback, error.advisory())
                }
                Err(e) => {
                    warn!(error = %e, "Radar proxy failed, using enhanced mock data");
                    self.enhanced(now, e.advisory())
                }
            }
        };

        self.note_mode(&snapshot.mode);
        snapshot
    }

    fn note_mode(&self, mode: &AdapterMode) {
        let mut last = self.last_mode.lock();
        if *last != Some(mode.name()) {
            info!(mode = mode.name(), "Adapter mode changed");
            *last = Some(mode.name());
        } else {
            debug!(mode = mode.name(), "Adapter refreshed");
        }
    }

    fn simulated(&self, now: DateTime<Local>) -> AdapterSnapshot {
        let mut rng = self.rng.lock();
        let current = self.simulator.generate(&mut *rng);
        let historical = generate_series(&mut *rng, now.timestamp_millis(), &SeriesProfile::basic());
        self.snapshot(current, historical, AdapterMode::Mock, None)
    }

    fn mapped(
        &self,
        now: DateTime<Local>,
        data: &Value,
        mode: AdapterMode,
        error: Option<String>,
    ) -> AdapterSnapshot {
        let series = series_values(data);
        let mut rng = self.rng.lock();
        let values = map_series(&mut *rng, &self.exchanges, &self.mapped_regions, &series);
        let historical = generate_series(
            &mut *rng,
            now.timestamp_millis(),
            &SeriesProfile::anchored(&values),
        );
        let current = LatencySnapshot::new(values, mode.source());
        self.snapshot(current, historical, mode, error)
    }

    fn enhanced(&self, now: DateTime<Local>, error: Option<String>) -> AdapterSnapshot {
        let mut rng = self.rng.lock();
        let values = enhanced_mock(&mut *rng, &self.exchanges, &self.mock_regions, now.hour());
        let historical = generate_series(
            &mut *rng,
            now.timestamp_millis(),
            &SeriesProfile::anchored(&values),
        );
        let mode = AdapterMode::Error;
        let current = LatencySnapshot::new(values, mode.source());
        self.snapshot(current, historical, mode, error)
    }

    fn snapshot(
        &self,
        current: LatencySnapshot,
        historical: HistoricalSeries,
        mode: AdapterMode,
        error: Option<String>,
    ) -> AdapterSnapshot {
        AdapterSnapshot {
            current,
            historical,
            error,
            has_api_key: self.has_api_key,
            mode,
            refreshed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeRange;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        result: Result<NetflowsResponse, AdapterError>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(result: Result<NetflowsResponse, AdapterError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NetflowSource for FixedSource {
        async fn fetch(&self) -> Result<NetflowsResponse, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn radar_payload(values: &[&str]) -> Value {
        let values: Vec<Value> = values.iter().map(|v| json!(["2024-01-01T00:00:00Z", v])).collect();
        json!({ "result": { "series": [ { "values": values } ] } })
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    fn assert_complete(snapshot: &AdapterSnapshot) {
        assert!(!snapshot.current.is_empty());
        assert!(snapshot.current.values.values().all(|v| *v >= 5.0));
        for range in TimeRange::ALL {
            assert_eq!(snapshot.historical[&range].len(), range.points());
        }
    }

    #[tokio::test]
    async fn test_no_key_never_fetches() {
        let source = FixedSource::new(Err(AdapterError::TransportFailure("unused".into())));
        let adapter = LatencyAdapter::with_seed(source.clone(), false, 1);

        let snapshot = adapter.refresh_at(noon()).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(!snapshot.has_api_key);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.mode, AdapterMode::Mock);
        assert_eq!(snapshot.current.source, DataSource::Simulated);
        assert_complete(&snapshot);
    }

    #[tokio::test]
    async fn test_live_data_maps_onto_adapter_regions() {
        let source = FixedSource::new(Ok(NetflowsResponse::success(
            radar_payload(&["0.31", "0.45", "0.52", "0.60"]),
            "https://radar.test/a",
        )));
        let adapter = LatencyAdapter::with_seed(source.clone(), true, 2);

        let snapshot = adapter.refresh_at(noon()).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            snapshot.mode,
            AdapterMode::Live {
                endpoint: "https://radar.test/a".into()
            }
        );
        assert_eq!(snapshot.error, None);
        assert!(snapshot.has_api_key);
        let adapter_regions = registry::adapter_region_ids();
        assert!(snapshot
            .current
            .values
            .keys()
            .all(|k| adapter_regions.iter().any(|r| k.ends_with(r))));
        assert_complete(&snapshot);
    }

    #[tokio::test]
    async fn test_server_fallback_sets_advisory() {
        let source = FixedSource::new(Ok(NetflowsResponse::fallback(
            "API endpoints returned errors - using enhanced mock data",
            radar_payload(&["55.10", "61.20"]),
        )));
        let adapter = LatencyAdapter::with_seed(source, true, 3);

        let snapshot = adapter.refresh_at(noon()).await;
        assert_eq!(snapshot.mode, AdapterMode::ServerFallback);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("API unavailable: API endpoints returned errors - using enhanced mock data")
        );
        assert_eq!(snapshot.current.source, DataSource::ServerFallback);
        assert_complete(&snapshot);
    }

    #[tokio::test]
    async fn test_failing_source_degrades_to_enhanced_mock() {
        let source = FixedSource::new(Err(AdapterError::HttpStatus {
            status: 502,
            body: "bad gateway".into(),
        }));
        let adapter = LatencyAdapter::with_seed(source, true, 4);

        let snapshot = adapter.refresh_at(noon()).await;
        assert_eq!(snapshot.mode, AdapterMode::Error);
        assert_eq!(snapshot.error.as_deref(), Some("Server API error: 502 - bad gateway"));
        assert_eq!(snapshot.current.source, DataSource::EnhancedMock);
        // peak surcharge applies at noon
        assert!(snapshot.current.values.values().all(|v| *v >= 25.0));
        assert_complete(&snapshot);
    }

    #[tokio::test]
    async fn test_unrecognised_body_is_malformed() {
        let source = FixedSource::new(Ok(NetflowsResponse {
            success: false,
            fallback: None,
            message: None,
            data: None,
            endpoint: None,
        }));
        let adapter = LatencyAdapter::with_seed(source, true, 5);

        let snapshot = adapter.refresh_at(noon()).await;
        assert_eq!(snapshot.mode, AdapterMode::Error);
        assert!(snapshot
            .error
            .unwrap()
            .starts_with("Unexpected server response format"));
    }

    #[tokio::test]
    async fn test_fallback_without_data_is_an_error() {
        let mut response = NetflowsResponse::fallback("m", Value::Null);
        response.data = None;
        let adapter = LatencyAdapter::with_seed(FixedSource::new(Ok(response)), true, 6);

        let snapshot = adapter.refresh_at(noon()).await;
        assert_eq!(snapshot.mode, AdapterMode::Error);
        assert_complete(&snapshot);
    }

    #[tokio::test]
    async fn test_same_seed_same_snapshot() {
        let make = || {
            LatencyAdapter::with_seed(
                FixedSource::new(Ok(NetflowsResponse::success(radar_payload(&["0.5"]), "e"))),
                true,
                42,
            )
        };
        let a = make().refresh_at(noon()).await;
        let b = make().refresh_at(noon()).await;
        assert_eq!(a.current.values, b.current.values);
        assert_eq!(a.historical, b.historical);
    }

    #[test]
    fn test_mode_serialization() {
        let v = serde_json::to_value(AdapterMode::Live {
            endpoint: "u".into(),
        })
        .unwrap();
        assert_eq!(v, json!({"kind": "live", "endpoint": "u"}));
        assert_eq!(
            serde_json::to_value(AdapterMode::ServerFallback).unwrap(),
            json!({"kind": "server_fallback"})
        );
    }
}
