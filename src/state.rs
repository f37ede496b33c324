//! Live data slices shared between the refresh tasks and the API
//!
//! Each slice is an immutable snapshot behind an `ArcSwap`; writers replace
//! the whole value and readers never block. Every write is announced on a
//! broadcast channel.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::adapter::AdapterSnapshot;
use crate::models::{DataSource, HistoricalSeries, LatencySnapshot};

const EVENT_CAPACITY: usize = 64;

/// Simulated historical series with its generation time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSnapshot {
    pub series: HistoricalSeries,
    pub generated_at: DateTime<Utc>,
}

impl HistoricalSnapshot {
    pub fn new(series: HistoricalSeries) -> Self {
        Self {
            series,
            generated_at: Utc::now(),
        }
    }
}

/// Pushed to subscribers after every slice swap
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LiveEvent {
    Latency(Arc<LatencySnapshot>),
    Historical(Arc<HistoricalSnapshot>),
    Adapter(Arc<AdapterSnapshot>),
}

impl LiveEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LiveEvent::Latency(_) => "latency",
            LiveEvent::Historical(_) => "historical",
            LiveEvent::Adapter(_) => "adapter",
        }
    }
}

pub struct LiveData {
    latency: ArcSwap<LatencySnapshot>,
    historical: ArcSwap<HistoricalSnapshot>,
    adapter: ArcSwap<AdapterSnapshot>,
    events: broadcast::Sender<LiveEvent>,
}

impl LiveData {
    pub fn new(has_api_key: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            latency: ArcSwap::from_pointee(LatencySnapshot::empty(DataSource::Simulated)),
            historical: ArcSwap::from_pointee(HistoricalSnapshot::new(HistoricalSeries::new())),
            adapter: ArcSwap::from_pointee(AdapterSnapshot::pending(has_api_key)),
            events,
        }
    }

    pub fn latency(&self) -> Arc<LatencySnapshot> {
        self.latency.load_full()
    }

    pub fn historical(&self) -> Arc<HistoricalSnapshot> {
        self.historical.load_full()
    }

    pub fn adapter(&self) -> Arc<AdapterSnapshot> {
        self.adapter.load_full()
    }

    pub fn publish_latency(&self, snapshot: LatencySnapshot) {
        let snapshot = Arc::new(snapshot);
        self.latency.store(snapshot.clone());
        self.notify(LiveEvent::Latency(snapshot));
    }

    pub fn publish_historical(&self, snapshot: HistoricalSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.historical.store(snapshot.clone());
        self.notify(LiveEvent::Historical(snapshot));
    }

    pub fn publish_adapter(&self, snapshot: AdapterSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.adapter.store(snapshot.clone());
        self.notify(LiveEvent::Adapter(snapshot));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: LiveEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
