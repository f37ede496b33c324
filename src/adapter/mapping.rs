//! Turning radar series (or nothing at all) into pair latencies

use rand::Rng;

use super::geography::geographic_offset;
use crate::latency::clamp_latency;
use crate::latency::simulator::pick_regions;
use crate::models::{pair_key, LatencyMap};

/// Base used for a pair when no series value is available
const FALLBACK_BASE_RANGE: std::ops::Range<f64> = 20.0..100.0;
const NETWORK_LOAD_RANGE: std::ops::Range<f64> = 10.0..40.0;

/// Surcharge during local business hours (ms)
pub const PEAK_SURCHARGE_MS: f64 = 15.0;
pub const PEAK_HOURS: std::ops::RangeInclusive<u32> = 8..=18;

/// Radar values at or below 1.0 are normalized fractions; larger ones are
/// already milliseconds.
pub fn scale_series_value(value: f64) -> f64 {
    if value.abs() <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

pub fn peak_surcharge(local_hour: u32) -> f64 {
    if PEAK_HOURS.contains(&local_hour) {
        PEAK_SURCHARGE_MS
    } else {
        0.0
    }
}

/// Map series values onto a random 2-4 region subset per exchange.
///
/// The i-th connection of an exchange takes `series[i % len]`; an empty
/// series draws a random base instead. The geography offset is added on top.
pub fn map_series<R: Rng + ?Sized>(
    rng: &mut R,
    exchanges: &[&str],
    regions: &[&str],
    series: &[f64],
) -> LatencyMap {
    let mut values = LatencyMap::new();
    for exchange in exchanges {
        for (i, region) in pick_regions(rng, regions).into_iter().enumerate() {
            let base = match series.get(i % series.len().max(1)) {
                Some(v) => scale_series_value(*v),
                None => rng.gen_range(FALLBACK_BASE_RANGE),
            };
            let geo = geographic_offset(rng, exchange, region);
            values.insert(pair_key(exchange, region), clamp_latency(base, geo));
        }
    }
    values
}

/// Fully local estimate: geography offset plus network load plus a
/// business-hours surcharge.
pub fn enhanced_mock<R: Rng + ?Sized>(
    rng: &mut R,
    exchanges: &[&str],
    regions: &[&str],
    local_hour: u32,
) -> LatencyMap {
    let peak = peak_surcharge(local_hour);
    let mut values = LatencyMap::new();
    for exchange in exchanges {
        for region in pick_regions(rng, regions) {
            let geo = geographic_offset(rng, exchange, region);
            let load = rng.gen_range(NETWORK_LOAD_RANGE);
            values.insert(pair_key(exchange, region), clamp_latency(geo + load, peak));
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_scale_series_value() {
        assert_eq!(scale_series_value(0.42), 42.0);
        assert_eq!(scale_series_value(1.0), 100.0);
        assert_eq!(scale_series_value(87.5), 87.5);
    }

    #[test]
    fn test_peak_hours_inclusive() {
        assert_eq!(peak_surcharge(7), 0.0);
        assert_eq!(peak_surcharge(8), PEAK_SURCHARGE_MS);
        assert_eq!(peak_surcharge(18), PEAK_SURCHARGE_MS);
        assert_eq!(peak_surcharge(19), 0.0);
    }

    #[test]
    fn test_map_series_uses_known_geography() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let map = map_series(&mut rng, &["binance-us-east"], &["aws-us-east-1"], &[0.4]);
        // 40ms base plus a ~0.84ms offset, rounded
        assert_eq!(map.get("binance-us-east-aws-us-east-1"), Some(&41.0));
    }

    #[test]
    fn test_map_series_only_adapter_regions() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let exchanges = registry::exchange_ids();
        let regions = registry::adapter_region_ids();
        let map = map_series(&mut rng, &exchanges, &regions, &[55.0, 61.0, 70.0]);

        for exchange in &exchanges {
            let count = map.keys().filter(|k| k.starts_with(&format!("{exchange}-"))).count();
            assert!((2..=4).contains(&count), "{exchange} has {count} connections");
        }
        for (key, v) in &map {
            assert!(regions.iter().any(|r| key.ends_with(r)));
            assert!(*v >= 5.0);
        }
    }

    #[test]
    fn test_empty_series_draws_bases() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let map = map_series(&mut rng, &["kraken-germany"], &["azure-uksouth", "aws-us-west-2"], &[]);
        assert_eq!(map.len(), 2);
        for v in map.values() {
            // base in [20,100) plus offset in [0,20)
            assert!((20.0..=120.0).contains(v));
        }
    }

    #[test]
    fn test_enhanced_mock_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let exchanges = registry::exchange_ids();
        let regions = registry::region_ids();

        let off_peak = enhanced_mock(&mut rng, &exchanges, &regions, 3);
        let peak = enhanced_mock(&mut rng, &exchanges, &regions, 12);
        assert!(!off_peak.is_empty());
        assert!(off_peak.values().all(|v| *v >= 10.0));
        assert!(peak.values().all(|v| *v >= 25.0));
    }
}
