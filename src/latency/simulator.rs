//! Synthetic per-pair latency generation
//!
//! Each refresh picks 2-4 random regions per exchange and draws an
//! unweighted latency for every selected pair. Nothing carries over between
//! refreshes: a pair present in one snapshot may vanish from the next.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{pair_key, DataSource, LatencyMap, LatencySnapshot};

/// Floor applied to every generated latency (ms)
pub const MIN_LATENCY_MS: f64 = 5.0;

pub const MIN_CONNECTIONS: usize = 2;
pub const MAX_CONNECTIONS: usize = 4;

const BASE_RANGE: std::ops::Range<f64> = 20.0..120.0;
const VARIATION_RANGE: std::ops::Range<f64> = -10.0..10.0;

/// `max(5, round(base + variation))`
pub fn clamp_latency(base: f64, variation: f64) -> f64 {
    (base + variation).round().max(MIN_LATENCY_MS)
}

/// Number of regions an exchange connects to this cycle, uniform in 2..=4.
/// Capped by the number of regions available.
pub fn connection_count<R: Rng + ?Sized>(rng: &mut R, available: usize) -> usize {
    rng.gen_range(MIN_CONNECTIONS..=MAX_CONNECTIONS).min(available)
}

/// Random subset of `regions` for one exchange
pub fn pick_regions<'a, R: Rng + ?Sized>(rng: &mut R, regions: &[&'a str]) -> Vec<&'a str> {
    let count = connection_count(rng, regions.len());
    let mut shuffled = regions.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count);
    shuffled
}

#[derive(Debug, Clone)]
pub struct LatencySimulator {
    exchanges: Vec<&'static str>,
    regions: Vec<&'static str>,
}

impl LatencySimulator {
    pub fn new(exchanges: Vec<&'static str>, regions: Vec<&'static str>) -> Self {
        Self { exchanges, regions }
    }

    /// Simulator over the full location registry
    pub fn from_registry() -> Self {
        Self::new(crate::registry::exchange_ids(), crate::registry::region_ids())
    }

    pub fn exchanges(&self) -> &[&'static str] {
        &self.exchanges
    }

    pub fn regions(&self) -> &[&'static str] {
        &self.regions
    }

    pub fn generate_map<R: Rng + ?Sized>(&self, rng: &mut R) -> LatencyMap {
        let mut values = LatencyMap::new();
        for exchange in &self.exchanges {
            for region in pick_regions(rng, &self.regions) {
                let base = rng.gen_range(BASE_RANGE);
                let variation = rng.gen_range(VARIATION_RANGE);
                values.insert(pair_key(exchange, region), clamp_latency(base, variation));
            }
        }
        values
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> LatencySnapshot {
        LatencySnapshot::new(self.generate_map(rng), DataSource::Simulated)
    }
}
