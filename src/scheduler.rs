//! Periodic refresh tasks
//!
//! Three independent timers, each owning one slice of [`LiveData`]. The first
//! tick fires immediately so the API has data right after startup. Missed
//! ticks are skipped rather than bursted.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::adapter::LatencyAdapter;
use crate::config::RefreshIntervals;
use crate::latency::{generate_series, LatencySimulator, SeriesProfile};
use crate::state::{HistoricalSnapshot, LiveData};

/// Owns the refresh tasks; dropping it stops them
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(
        live: Arc<LiveData>,
        simulator: LatencySimulator,
        adapter: Arc<LatencyAdapter>,
        intervals: &RefreshIntervals,
    ) -> Self {
        info!(
            latency_ms = intervals.latency.as_millis() as u64,
            historical_ms = intervals.historical.as_millis() as u64,
            adapter_ms = intervals.adapter.as_millis() as u64,
            "Starting refresh tasks"
        );

        let handles = vec![
            tokio::spawn(latency_loop(live.clone(), simulator, intervals.latency)),
            tokio::spawn(historical_loop(live.clone(), intervals.historical)),
            tokio::spawn(adapter_loop(live, adapter, intervals.adapter)),
        ];
        Self { handles }
    }

    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }

    /// Abort every task. In-flight adapter fetches are left to finish.
    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        debug!("Refresh tasks stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn latency_loop(live: Arc<LiveData>, simulator: LatencySimulator, period: Duration) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        let snapshot = simulator.generate(&mut rng);
        debug!(pairs = snapshot.len(), "Latency snapshot refreshed");
        live.publish_latency(snapshot);
    }
}

async fn historical_loop(live: Arc<LiveData>, period: Duration) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let series = generate_series(&mut rng, now_ms, &SeriesProfile::basic());
        live.publish_historical(HistoricalSnapshot::new(series));
    }
}

/// Each fetch runs in its own task so a slow proxy never delays the next
/// tick. Overlapping fetches are allowed; the last one to finish wins.
async fn adapter_loop(live: Arc<LiveData>, adapter: Arc<LatencyAdapter>, period: Duration) {
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        let live = live.clone();
        let adapter = adapter.clone();
        tokio::spawn(async move {
            let snapshot = adapter.refresh().await;
            live.publish_adapter(snapshot);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::NetflowSource;
    use crate::error::AdapterError;
    use crate::radar::NetflowsResponse;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct Unreachable;

    #[async_trait]
    impl NetflowSource for Unreachable {
        async fn fetch(&self) -> Result<NetflowsResponse, AdapterError> {
            Err(AdapterError::TransportFailure("connection refused".into()))
        }
    }

    fn fast_intervals() -> RefreshIntervals {
        RefreshIntervals {
            latency: Duration::from_millis(20),
            historical: Duration::from_millis(30),
            adapter: Duration::from_millis(25),
        }
    }

    #[tokio::test]
    async fn test_all_slices_get_published() {
        let live = Arc::new(LiveData::new(true));
        let mut rx = live.subscribe();
        let adapter = Arc::new(LatencyAdapter::new(Arc::new(Unreachable), true));
        let _scheduler = Scheduler::start(
            live.clone(),
            LatencySimulator::from_registry(),
            adapter,
            &fast_intervals(),
        );

        let mut seen = HashSet::new();
        let collect = async {
            while seen.len() < 3 {
                if let Ok(event) = rx.recv().await {
                    seen.insert(event.kind());
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), collect)
            .await
            .expect("every slice publishes");

        assert!(!live.latency().is_empty());
        assert_eq!(live.historical().series.len(), 4);
        let adapter = live.adapter();
        assert!(adapter.error.is_some());
        assert!(!adapter.current.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_publishing() {
        let live = Arc::new(LiveData::new(false));
        let adapter = Arc::new(LatencyAdapter::new(Arc::new(Unreachable), false));
        let mut scheduler = Scheduler::start(
            live.clone(),
            LatencySimulator::from_registry(),
            adapter,
            &fast_intervals(),
        );
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.shutdown();
        assert!(!scheduler.is_running());

        // let any in-flight adapter fetch land, then expect silence
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut rx = live.subscribe();
        let quiet = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(quiet.is_err(), "no events after shutdown");
    }
}
