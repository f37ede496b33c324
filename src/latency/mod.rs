//! Latency generation and aggregation
//!
//! - `simulator`: per-pair synthetic latency, regenerated wholesale
//! - `historical`: time-bucketed series for the chart ranges
//! - `stats`: averages, quality bands, server status

pub mod historical;
pub mod simulator;
pub mod stats;

pub use historical::{generate_range, generate_series, SeriesProfile, MIN_HISTORICAL_MS};
pub use simulator::{clamp_latency, LatencySimulator, MIN_LATENCY_MS};
pub use stats::{LatencyQuality, LatencyStats, ServerStatus};
