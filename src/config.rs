//! Service configuration
//!
//! Command-line flags (each with an environment fallback) select the bind
//! address, proxy URL and log filter. Refresh cadences and radar endpoints
//! come from an optional TOML file; every field there has a default.

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::radar::RadarConfig;

/// Environment variables consulted for the upstream credential, in order
pub const API_KEY_VARS: [&str; 2] = ["CLOUDFLARE_API_KEY", "VITE_CLOUDFLARE_API_KEY"];

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_LOG_FILTER: &str = "globe_latency=debug,tower_http=info";

#[derive(Parser, Debug, Clone)]
#[command(name = "globe-latency")]
#[command(about = "Exchange to cloud-region latency service with radar proxy")]
pub struct Args {
    /// Address the HTTP server listens on
    #[arg(long, env = "GLOBE_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Path to TOML configuration file
    #[arg(short, long, env = "GLOBE_CONFIG_PATH")]
    pub config: Option<String>,

    /// URL the adapter polls for radar data (defaults to this server's own proxy route)
    #[arg(long, env = "GLOBE_PROXY_URL")]
    pub proxy_url: Option<String>,

    /// tracing filter directive, e.g. "info" or "globe_latency=trace"
    #[arg(short, long, env = "GLOBE_LOG")]
    pub log_level: Option<String>,
}

impl Args {
    pub fn proxy_url(&self) -> String {
        self.proxy_url
            .clone()
            .unwrap_or_else(|| default_proxy_url(&self.bind))
    }

    pub fn log_filter(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

/// Loopback URL of the proxy route on the given bind address
pub fn default_proxy_url(bind: &SocketAddr) -> String {
    format!("http://127.0.0.1:{}/api/radar/netflows", bind.port())
}

/// Periodic task cadences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshIntervals {
    /// Simulator snapshot
    #[serde(with = "duration_serde")]
    pub latency: Duration,
    /// Basic historical series
    #[serde(with = "duration_serde")]
    pub historical: Duration,
    /// Adapter fetch
    #[serde(with = "duration_serde")]
    pub adapter: Duration,
}

impl RefreshIntervals {
    /// Every cadence must be non-zero; a zero period would stop its task.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, period) in [
            ("latency", self.latency),
            ("historical", self.historical),
            ("adapter", self.adapter),
        ] {
            if period.is_zero() {
                anyhow::bail!("intervals.{name} must be greater than zero");
            }
        }
        Ok(())
    }
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            latency: Duration::from_secs(5),
            historical: Duration::from_secs(60),
            adapter: Duration::from_secs(10),
        }
    }
}

/// Contents of the optional TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub intervals: RefreshIntervals,
    pub radar: RadarConfig,
}

impl FileConfig {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("invalid configuration file")?;
        config
            .intervals
            .validate()
            .context("invalid configuration file")?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load from `path` if given, otherwise defaults
    pub async fn load_or_default(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }
}

/// First non-empty credential among [`API_KEY_VARS`]
pub fn api_key_from_env() -> Option<String> {
    api_key_from(|name| std::env::var(name).ok())
}

fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Durations as integer milliseconds
pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
