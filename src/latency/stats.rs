//! Aggregations over latency snapshots used by the dashboard views

use serde::Serialize;

use crate::models::LatencySnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl LatencyStats {
    /// Empty input yields all zeros
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            count,
            average: sum / count as f64,
            min,
            max,
        }
    }

    pub fn from_snapshot(snapshot: &LatencySnapshot) -> Self {
        Self::from_values(snapshot.values.values().copied())
    }

    pub fn for_exchange(snapshot: &LatencySnapshot, exchange_id: &str) -> Self {
        Self::from_values(snapshot.for_exchange(exchange_id))
    }
}

/// Colour band for a single connection or an averaged exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyQuality {
    Excellent,
    Good,
    Poor,
}

impl LatencyQuality {
    pub fn classify(latency_ms: f64) -> Self {
        if latency_ms < 50.0 {
            LatencyQuality::Excellent
        } else if latency_ms < 100.0 {
            LatencyQuality::Good
        } else {
            LatencyQuality::Poor
        }
    }

    /// Hex colour used for connection arcs
    pub fn color(&self) -> &'static str {
        match self {
            LatencyQuality::Excellent => "#00FF00",
            LatencyQuality::Good => "#FFFF00",
            LatencyQuality::Poor => "#FF0000",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Online,
    Degraded,
    Offline,
}

impl ServerStatus {
    pub fn from_average(avg_ms: f64) -> Self {
        if avg_ms < 100.0 {
            ServerStatus::Online
        } else if avg_ms < 200.0 {
            ServerStatus::Degraded
        } else {
            ServerStatus::Offline
        }
    }
}
