//! Historical latency series for the 1h / 24h / 7d / 30d chart ranges
//!
//! Points follow a diurnal sine (and, for the adapter profile, a weekly one)
//! plus bounded noise. Every call regenerates the full series; there is no
//! continuity between calls.

use rand::Rng;
use std::f64::consts::TAU;

use crate::models::{HistoricalPoint, HistoricalSeries, LatencyMap, TimeRange, DAY_MS, WEEK_MS};

/// Floor for every historical point (ms)
pub const MIN_HISTORICAL_MS: f64 = 10.0;

const BASELINE_RANGE: std::ops::Range<f64> = 50.0..100.0;

/// Shape parameters for a generated series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesProfile {
    /// Fixed baseline; `None` draws a fresh uniform baseline per point
    pub baseline: Option<f64>,
    pub daily_amplitude: f64,
    pub weekly_amplitude: f64,
    /// Noise is uniform in `[-noise_half_width, noise_half_width)`
    pub noise_half_width: f64,
}

impl SeriesProfile {
    /// Plain simulator profile: random baseline, daily swing of ±10ms, ±10ms noise
    pub fn basic() -> Self {
        Self {
            baseline: None,
            daily_amplitude: 10.0,
            weekly_amplitude: 0.0,
            noise_half_width: 10.0,
        }
    }

    /// Adapter profile anchored on the mean of the current latency map
    pub fn anchored(current: &LatencyMap) -> Self {
        Self {
            baseline: mean(current.values().copied()),
            daily_amplitude: 15.0,
            weekly_amplitude: 8.0,
            noise_half_width: 12.5,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn daily_pattern(timestamp_ms: i64, amplitude: f64) -> f64 {
    (timestamp_ms as f64 / DAY_MS as f64 * TAU).sin() * amplitude
}

pub fn weekly_pattern(timestamp_ms: i64, amplitude: f64) -> f64 {
    (timestamp_ms as f64 / WEEK_MS as f64 * TAU).sin() * amplitude
}

fn point<R: Rng + ?Sized>(rng: &mut R, timestamp: i64, profile: &SeriesProfile) -> HistoricalPoint {
    let baseline = match profile.baseline {
        Some(b) => b,
        None => rng.gen_range(BASELINE_RANGE),
    };
    let noise = if profile.noise_half_width > 0.0 {
        rng.gen_range(-profile.noise_half_width..profile.noise_half_width)
    } else {
        0.0
    };
    let raw = baseline
        + daily_pattern(timestamp, profile.daily_amplitude)
        + weekly_pattern(timestamp, profile.weekly_amplitude)
        + noise;

    HistoricalPoint {
        timestamp,
        latency: raw.round().max(MIN_HISTORICAL_MS),
    }
}

/// Points for one range ending at `now_ms`, oldest first
pub fn generate_range<R: Rng + ?Sized>(
    rng: &mut R,
    range: TimeRange,
    now_ms: i64,
    profile: &SeriesProfile,
) -> Vec<HistoricalPoint> {
    let interval = range.interval_ms();
    (0..range.points())
        .rev()
        .map(|i| point(rng, now_ms - i as i64 * interval, profile))
        .collect()
}

/// All four ranges
pub fn generate_series<R: Rng + ?Sized>(
    rng: &mut R,
    now_ms: i64,
    profile: &SeriesProfile,
) -> HistoricalSeries {
    TimeRange::ALL
        .into_iter()
        .map(|range| (range, generate_range(rng, range, now_ms, profile)))
        .collect()
}
