use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Cloud provider hosting an exchange or a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "GCP")]
    Gcp,
    #[serde(rename = "Azure")]
    Azure,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Gcp, Provider::Azure];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Gcp => "GCP",
            Provider::Azure => "Azure",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "gcp" => Ok(Provider::Gcp),
            "azure" => Ok(Provider::Azure),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// A trading venue pinned to a datacenter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub id: &'static str,
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "cloudProvider")]
    pub provider: Provider,
    /// Provider-native region code, e.g. `us-east-1`
    pub region: &'static str,
    #[serde(rename = "volume24h", skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// A cloud-provider datacenter location
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRegion {
    pub id: &'static str,
    pub region_name: &'static str,
    pub provider: Provider,
    pub latitude: f64,
    pub longitude: f64,
    pub server_count: u32,
}

/// Composite key `"<exchangeId>-<regionId>"`
pub fn pair_key(exchange_id: &str, region_id: &str) -> String {
    format!("{exchange_id}-{region_id}")
}

/// Latency in ms per exchange-region pair
pub type LatencyMap = BTreeMap<String, f64>;

/// Where a latency snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Simulated,
    Live,
    ServerFallback,
    EnhancedMock,
}

/// One whole generation of pair latencies. Replaced, never patched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySnapshot {
    pub values: LatencyMap,
    pub source: DataSource,
    pub generated_at: DateTime<Utc>,
}

impl LatencySnapshot {
    pub fn new(values: LatencyMap, source: DataSource) -> Self {
        Self {
            values,
            source,
            generated_at: Utc::now(),
        }
    }

    pub fn empty(source: DataSource) -> Self {
        Self::new(LatencyMap::new(), source)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, exchange_id: &str, region_id: &str) -> Option<f64> {
        self.values.get(&pair_key(exchange_id, region_id)).copied()
    }

    /// All values whose key belongs to `exchange_id`
    pub fn for_exchange<'a>(&'a self, exchange_id: &str) -> impl Iterator<Item = f64> + 'a {
        let prefix = format!("{exchange_id}-");
        self.values
            .iter()
            .filter(move |(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub latency: f64,
}

/// Historical window selectable in the latency chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    OneWeek,
    #[serde(rename = "30d")]
    OneMonth,
}

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::OneHour,
        TimeRange::OneDay,
        TimeRange::OneWeek,
        TimeRange::OneMonth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::OneDay => "24h",
            TimeRange::OneWeek => "7d",
            TimeRange::OneMonth => "30d",
        }
    }

    pub fn points(&self) -> usize {
        match self {
            TimeRange::OneHour => 60,
            TimeRange::OneDay => 24,
            TimeRange::OneWeek => 7,
            TimeRange::OneMonth => 30,
        }
    }

    pub fn interval_ms(&self) -> i64 {
        match self {
            TimeRange::OneHour => MINUTE_MS,
            TimeRange::OneDay => HOUR_MS,
            TimeRange::OneWeek | TimeRange::OneMonth => DAY_MS,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.label() == s.trim())
            .ok_or_else(|| format!("unknown time range '{s}' (expected 1h, 24h, 7d or 30d)"))
    }
}

/// Range label -> ordered points, oldest first
pub type HistoricalSeries = BTreeMap<TimeRange, Vec<HistoricalPoint>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_format() {
        assert_eq!(
            pair_key("binance-us-east", "aws-us-east-1"),
            "binance-us-east-aws-us-east-1"
        );
    }

    #[test]
    fn test_provider_roundtrip() {
        assert_eq!("azure".parse::<Provider>().unwrap(), Provider::Azure);
        assert_eq!(" AWS ".parse::<Provider>().unwrap(), Provider::Aws);
        assert!("oracle".parse::<Provider>().is_err());
        assert_eq!(serde_json::to_string(&Provider::Gcp).unwrap(), "\"GCP\"");
    }

    #[test]
    fn test_time_range_labels() {
        let labels: Vec<_> = TimeRange::ALL.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["1h", "24h", "7d", "30d"]);
        assert_eq!("7d".parse::<TimeRange>().unwrap(), TimeRange::OneWeek);
        assert!("90d".parse::<TimeRange>().is_err());
        assert_eq!(
            serde_json::to_string(&TimeRange::OneMonth).unwrap(),
            "\"30d\""
        );
    }

    #[test]
    fn test_snapshot_for_exchange_uses_prefix() {
        let mut values = LatencyMap::new();
        values.insert(pair_key("okx-hong-kong", "aws-us-east-1"), 40.0);
        values.insert(pair_key("okx-hong-kong", "gcp-asia-east2"), 60.0);
        values.insert(pair_key("okx-us-central", "gcp-us-central1"), 10.0);
        let snap = LatencySnapshot::new(values, DataSource::Simulated);

        let sum: f64 = snap.for_exchange("okx-hong-kong").sum();
        assert_eq!(sum, 100.0);
        assert_eq!(snap.get("okx-us-central", "gcp-us-central1"), Some(10.0));
    }
}
