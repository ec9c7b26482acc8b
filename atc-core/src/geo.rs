//! Great-circle distance and bearing on a spherical Earth.

/// Mean Earth radius in meters (same sphere Qt Positioning uses).
pub const EARTH_RADIUS_M: f64 = 6_371_007.2;

/// Distance/bearing function injected into the tracker.
pub trait GreatCircle: Send + Sync {
    /// Great-circle distance in meters between two `(lat, lon)` points in degrees.
    fn distance_m(&self, from: (f64, f64), to: (f64, f64)) -> f64;

    /// Initial bearing in degrees from `from` towards `to`, in `[0, 360)`.
    /// May be NaN for degenerate input.
    fn initial_bearing_deg(&self, from: (f64, f64), to: (f64, f64)) -> f64;
}

/// Haversine distance, forward-azimuth bearing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl GreatCircle for Haversine {
    fn distance_m(&self, from: (f64, f64), to: (f64, f64)) -> f64 {
        haversine_m(from.0, from.1, to.0, to.1)
    }

    fn initial_bearing_deg(&self, from: (f64, f64), to: (f64, f64)) -> f64 {
        initial_bearing_deg(from.0, from.1, to.0, to.1)
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing in degrees, normalized to `[0, 360)`.
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
    normalize_deg(y.atan2(x).to_degrees())
}

/// Wrap an angle into `[0, 360)`. NaN passes through.
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative input
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_m(25.0, 55.0, 25.0, 55.0), 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        // one degree of arc on this sphere
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.08).abs() < 1.0, "d={d}");
    }

    #[test]
    fn test_known_distance() {
        // Dubai to Hamad, roughly 380 km
        let d = haversine_m(25.251578, 55.368344, 25.269956, 51.602756);
        assert!(d > 370_000.0 && d < 390_000.0, "d={d}");
    }

    #[test]
    fn test_bearing_cardinal() {
        assert!(initial_bearing_deg(10.0, 20.0, 11.0, 20.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 20.0, 0.0, 21.0) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_deg(11.0, 20.0, 10.0, 20.0) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 21.0, 0.0, 20.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_deg(-90.0), 270.0);
        assert_eq!(normalize_deg(360.0), 0.0);
        assert_eq!(normalize_deg(725.0), 5.0);
        assert!(normalize_deg(f64::NAN).is_nan());
    }

    #[test]
    fn test_trait_object() {
        let g: &dyn GreatCircle = &Haversine;
        assert!((g.distance_m((0.0, 0.0), (0.0, 1.0)) - 111_195.08).abs() < 1.0);
        assert!((g.initial_bearing_deg((0.0, 0.0), (0.0, 1.0)) - 90.0).abs() < 1e-9);
    }
}
