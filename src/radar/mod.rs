//! Network-quality proxy for the third-party radar API
//!
//! `GET /api/radar/netflows` walks a fixed list of upstream endpoints with a
//! bearer credential and returns the first success. Without a credential, or
//! when every endpoint fails, it answers with synthetic series instead. The
//! HTTP status is always 200; the outcome is encoded in the body.

pub mod proxy;
pub mod upstream;

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub use proxy::RadarProxy;
pub use upstream::{HttpUpstream, UpstreamClient};

pub const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://api.cloudflare.com/client/v4/radar/netflows/timeseries?dateRange=1d&format=json",
    "https://api.cloudflare.com/client/v4/radar/quality/iqi/timeseries?dateRange=1d&format=json",
    "https://api.cloudflare.com/client/v4/radar/datasets",
];

/// Number of hourly points in the synthetic payload
pub const MOCK_POINTS: usize = 24;

/// Proxy settings, loadable from the TOML config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Tried in order; first 2xx wins
    pub endpoints: Vec<String>,
    /// Per-request timeout
    #[serde(with = "crate::config::duration_serde")]
    pub request_timeout: Duration,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Body of `GET /api/radar/netflows`
///
/// Success: `{success: true, data, endpoint}`.
/// Fallback: `{success: false, fallback: true, message, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetflowsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl NetflowsResponse {
    pub fn success(data: Value, endpoint: impl Into<String>) -> Self {
        Self {
            success: true,
            fallback: None,
            message: None,
            data: Some(data),
            endpoint: Some(endpoint.into()),
        }
    }

    pub fn fallback(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            fallback: Some(true),
            message: Some(message.into()),
            data: Some(data),
            endpoint: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.unwrap_or(false)
    }
}

/// Synthetic radar payload: one series of hourly `[ISO8601, "value"]` pairs,
/// oldest first, values in `[20, 120)` with two decimals.
pub fn mock_series<R: Rng + ?Sized>(rng: &mut R) -> Value {
    let now = Utc::now();
    let values: Vec<Value> = (0..MOCK_POINTS)
        .map(|i| {
            let hours_ago = (MOCK_POINTS - 1 - i) as i64;
            let ts = now - ChronoDuration::hours(hours_ago);
            let value: f64 = rng.gen_range(0.0..100.0) + 20.0;
            json!([
                ts.to_rfc3339_opts(SecondsFormat::Millis, true),
                format!("{value:.2}")
            ])
        })
        .collect();

    json!({ "result": { "series": [ { "values": values } ] } })
}

/// Numeric values of the first series in a radar payload.
///
/// Accepts `result.series[0].values[*][1]` as either a number or a numeric
/// string; anything else is skipped.
pub fn series_values(data: &Value) -> Vec<f64> {
    data.pointer("/result/series/0/values")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|entry| entry.get(1))
                .filter_map(|v| match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                })
                .filter(|v| v.is_finite())
                .collect()
        })
        .unwrap_or_default()
}
