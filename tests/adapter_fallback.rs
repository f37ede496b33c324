//! End-to-end adapter tests over real HTTP
//!
//! Each test serves a router on an ephemeral loopback port and points the
//! adapter's `ProxyClient` at it.

use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Router};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use globe_latency::{
    adapter::{AdapterMode, LatencyAdapter, ProxyClient},
    api::{create_router, AppState},
    error::UpstreamError,
    models::{DataSource, TimeRange},
    radar::{RadarConfig, RadarProxy, UpstreamClient},
    state::LiveData,
    store::ViewStore,
};

struct AlwaysDown;

#[async_trait]
impl UpstreamClient for AlwaysDown {
    async fn get_json(&self, _url: &str, _api_key: &str) -> Result<Value, UpstreamError> {
        Err(UpstreamError::Status {
            status: 503,
            body: "maintenance".into(),
        })
    }
}

/// Serve `app` on 127.0.0.1 and return the netflows URL
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/radar/netflows")
}

fn adapter_for(url: String) -> LatencyAdapter {
    let client = ProxyClient::new(url, Duration::from_secs(5)).unwrap();
    LatencyAdapter::with_seed(Arc::new(client), true, 99)
}

fn assert_usable(snapshot: &globe_latency::adapter::AdapterSnapshot) {
    assert!(!snapshot.current.is_empty());
    assert!(snapshot.current.values.values().all(|v| *v >= 5.0));
    for range in TimeRange::ALL {
        assert_eq!(snapshot.historical[&range].len(), range.points());
    }
}

#[tokio::test]
async fn test_proxy_fallback_reaches_adapter() {
    let proxy = RadarProxy::new(
        Some("secret".into()),
        &RadarConfig::default(),
        Arc::new(AlwaysDown),
    );
    let state = AppState {
        live: Arc::new(LiveData::new(true)),
        view: ViewStore::default(),
        proxy: Arc::new(proxy),
    };
    let url = serve(create_router(state)).await;

    let snapshot = adapter_for(url).refresh().await;
    assert_eq!(snapshot.mode, AdapterMode::ServerFallback);
    assert_eq!(snapshot.current.source, DataSource::ServerFallback);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("API unavailable: API endpoints returned errors - using enhanced mock data")
    );
    assert!(snapshot.has_api_key);
    assert_usable(&snapshot);
}

#[tokio::test]
async fn test_proxy_500_uses_enhanced_mock() {
    let app = Router::new().route(
        "/api/radar/netflows",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = serve(app).await;

    let snapshot = adapter_for(url).refresh().await;
    assert_eq!(snapshot.mode, AdapterMode::Error);
    assert_eq!(snapshot.current.source, DataSource::EnhancedMock);
    assert_eq!(snapshot.error.as_deref(), Some("Server API error: 500 - boom"));
    assert_usable(&snapshot);
}

#[tokio::test]
async fn test_garbage_body_uses_enhanced_mock() {
    let app = Router::new().route("/api/radar/netflows", get(|| async { "<html>oops</html>" }));
    let url = serve(app).await;

    let snapshot = adapter_for(url).refresh().await;
    assert_eq!(snapshot.mode, AdapterMode::Error);
    assert!(snapshot
        .error
        .unwrap()
        .starts_with("Unexpected server response format"));
}

#[tokio::test]
async fn test_unreachable_proxy_uses_enhanced_mock() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let snapshot = adapter_for(format!("http://{addr}/api/radar/netflows"))
        .refresh()
        .await;
    assert_eq!(snapshot.mode, AdapterMode::Error);
    assert!(snapshot.error.is_some_and(|e| !e.is_empty()));
    assert!(!snapshot.current.is_empty());
}
