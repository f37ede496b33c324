//! Geographic helpers for placing locations on the globe

use rand::Rng;
use serde::Serialize;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Project latitude/longitude (degrees) onto a sphere of `radius`.
///
/// Y is up; longitude 0 lies on +X.
pub fn lat_lng_to_cartesian(lat: f64, lng: f64, radius: f64) -> [f64; 3] {
    let lat_rad = lat.to_radians();
    let lng_rad = lng.to_radians();

    [
        radius * lat_rad.cos() * lng_rad.cos(),
        radius * lat_rad.sin(),
        radius * lat_rad.cos() * lng_rad.sin(),
    ]
}

/// Haversine distance in kilometres
pub fn great_circle_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Rough distance-based latency: 10ms base plus 5ms per 1000km, jittered ±10ms.
pub fn estimate_latency<R: Rng + ?Sized>(distance_km: f64, rng: &mut R) -> f64 {
    let jitter = rng.gen_range(-10.0..10.0);
    (10.0 + distance_km / 1000.0 * 5.0 + jitter).round().max(5.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Continent {
    Europe,
    Asia,
    Africa,
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Australia,
    Unknown,
}

/// Bounding-box classification. Boxes overlap; first match wins.
pub fn continent(lat: f64, lng: f64) -> Continent {
    let within = |lat_lo: f64, lat_hi: f64, lng_lo: f64, lng_hi: f64| {
        (lat_lo..=lat_hi).contains(&lat) && (lng_lo..=lng_hi).contains(&lng)
    };

    if within(-10.0, 70.0, -25.0, 45.0) {
        Continent::Europe
    } else if within(-35.0, 70.0, 25.0, 180.0) {
        Continent::Asia
    } else if within(-40.0, 35.0, -20.0, 55.0) {
        Continent::Africa
    } else if within(15.0, 70.0, -170.0, -50.0) {
        Continent::NorthAmerica
    } else if within(-60.0, 15.0, -90.0, -30.0) {
        Continent::SouthAmerica
    } else if within(-50.0, -10.0, 110.0, 180.0) {
        Continent::Australia
    } else {
        Continent::Unknown
    }
}

/// Points along the great-circle arc between two locations, lifted off the
/// sphere by up to `lift` (fraction of radius) at the midpoint.
///
/// Returns `segments + 1` points; the first and last sit on the surface.
pub fn arc_points(
    from: (f64, f64),
    to: (f64, f64),
    segments: usize,
    radius: f64,
    lift: f64,
) -> Vec<[f64; 3]> {
    let segments = segments.max(1);
    let a = lat_lng_to_cartesian(from.0, from.1, 1.0);
    let b = lat_lng_to_cartesian(to.0, to.1, 1.0);

    let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
    let omega = dot.acos();
    let sin_omega = omega.sin();

    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            // slerp; falls back to lerp for (near) coincident points
            let (wa, wb) = if sin_omega.abs() < 1e-9 {
                (1.0 - t, t)
            } else {
                (
                    ((1.0 - t) * omega).sin() / sin_omega,
                    (t * omega).sin() / sin_omega,
                )
            };
            let p = [
                wa * a[0] + wb * b[0],
                wa * a[1] + wb * b[1],
                wa * a[2] + wb * b[2],
            ];
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt().max(1e-12);
            let height = radius * (1.0 + lift * (std::f64::consts::PI * t).sin());
            [
                p[0] / norm * height,
                p[1] / norm * height,
                p[2] / norm * height,
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn length(p: [f64; 3]) -> f64 {
        (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt()
    }

    #[test]
    fn test_cartesian_axes() {
        let p = lat_lng_to_cartesian(0.0, 0.0, 2.0);
        assert!((p[0] - 2.0).abs() < 1e-9);
        let north = lat_lng_to_cartesian(90.0, 0.0, 1.0);
        assert!((north[1] - 1.0).abs() < 1e-9);
        let east = lat_lng_to_cartesian(0.0, 90.0, 1.0);
        assert!((east[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_great_circle_known_distance() {
        // London -> Frankfurt is roughly 640km
        let d = great_circle_km(51.5074, -0.1278, 50.1109, 8.6821);
        assert!((d - 638.0).abs() < 15.0, "got {d}");
        assert!(great_circle_km(1.0, 2.0, 1.0, 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_latency_floor_and_growth() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(estimate_latency(0.0, &mut rng) >= 5.0);
        }
        // 20_000km => 110ms ± 10
        let far = estimate_latency(20_000.0, &mut rng);
        assert!((100.0..=120.0).contains(&far));
    }

    #[test]
    fn test_continent_order() {
        assert_eq!(continent(51.5, -0.1), Continent::Europe);
        assert_eq!(continent(35.6, 139.6), Continent::Asia);
        assert_eq!(continent(40.7, -74.0), Continent::NorthAmerica);
        assert_eq!(continent(-23.5, -46.6), Continent::SouthAmerica);
        // Sydney falls inside the Asia box first
        assert_eq!(continent(-33.8, 151.2), Continent::Asia);
        assert_eq!(continent(-45.0, 170.0), Continent::Australia);
        assert_eq!(continent(-80.0, 0.0), Continent::Unknown);
    }

    #[test]
    fn test_arc_endpoints_on_surface_and_midpoint_lifted() {
        let pts = arc_points((39.0, -76.6), (1.35, 103.8), 32, 1.0, 0.2);
        assert_eq!(pts.len(), 33);
        assert!((length(pts[0]) - 1.0).abs() < 1e-9);
        assert!((length(pts[32]) - 1.0).abs() < 1e-9);
        assert!((length(pts[16]) - 1.2).abs() < 1e-9);
    }
}
