//! Coarse geography offset added on top of adapter latencies
//!
//! Distance is Euclidean in degree space, not great-circle. Only a handful of
//! locations have coordinates here; any pair involving another location gets
//! a random offset in `[0, 20)` instead.

use rand::Rng;

const KNOWN_COORDINATES: [(&str, (f64, f64)); 7] = [
    ("binance-us-east", (39.0458, -76.6413)),
    ("binance-eu-west", (53.4084, -2.9916)),
    ("binance-asia-singapore", (1.3521, 103.8198)),
    ("okx-hong-kong", (22.3193, 114.1694)),
    ("aws-us-east-1", (38.9072, -77.0369)),
    ("gcp-us-central1", (41.5868, -93.6250)),
    ("azure-eastus", (37.3382, -79.0193)),
];

/// Milliseconds per degree of separation
const MS_PER_DEGREE: f64 = 2.0;
const UNKNOWN_OFFSET_MAX: f64 = 20.0;

pub fn known_coordinates(id: &str) -> Option<(f64, f64)> {
    KNOWN_COORDINATES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, coords)| *coords)
}

/// Degree-space distance times two, when both ends are in the lookup
pub fn distance_offset(exchange_id: &str, region_id: &str) -> Option<f64> {
    let (lat1, lng1) = known_coordinates(exchange_id)?;
    let (lat2, lng2) = known_coordinates(region_id)?;
    let distance = ((lat1 - lat2).powi(2) + (lng1 - lng2).powi(2)).sqrt();
    Some(distance * MS_PER_DEGREE)
}

pub fn geographic_offset<R: Rng + ?Sized>(rng: &mut R, exchange_id: &str, region_id: &str) -> f64 {
    distance_offset(exchange_id, region_id)
        .unwrap_or_else(|| rng.gen_range(0.0..UNKNOWN_OFFSET_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_known_pair_uses_distance() {
        let offset = distance_offset("binance-us-east", "aws-us-east-1").unwrap();
        let expected = ((39.0458f64 - 38.9072).powi(2) + (-76.6413f64 + 77.0369).powi(2)).sqrt() * 2.0;
        assert!((offset - expected).abs() < 1e-9);
        assert!(offset < 1.0);
    }

    #[test]
    fn test_far_known_pair() {
        let offset = distance_offset("binance-asia-singapore", "gcp-us-central1").unwrap();
        assert!(offset > 300.0);
    }

    #[test]
    fn test_unknown_pair_gets_random_small_offset() {
        assert!(distance_offset("kraken-germany", "aws-us-east-1").is_none());
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..100 {
            let o = geographic_offset(&mut rng, "kraken-germany", "azure-uksouth");
            assert!((0.0..20.0).contains(&o));
        }
    }
}
