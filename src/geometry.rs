//! Compass bearings between nearby coordinates.
//!
//! Uses a local equirectangular projection: longitudes are scaled by the
//! cosine of the origin latitude and the result treated as a flat plane.
//! Only valid over the short distances between consecutive stops.

/// Below this projected longitude delta, two points are treated as lying on
/// the same meridian.
pub const MERIDIAN_EPSILON: f64 = 1e-9;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Bearing from `self` to `other`. See [`bearing`].
    pub fn bearing_to(&self, other: &LatLon) -> f64 {
        bearing(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Returns the compass bearing in degrees from `(lat1, lon1)` to `(lat2, lon2)`,
/// with 0° = north and 90° = east.
///
/// The result lies in `(-180, 180]`. Points on the same projected meridian
/// return exactly `0.0` (north) or `180.0` (south).
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let scale = lat1.to_radians().cos();

    let dlon = lon2 * scale - lon1 * scale;
    let dlat = lat2 - lat1;

    if dlon.abs() < MERIDIAN_EPSILON {
        return if dlat < 0.0 { 180.0 } else { 0.0 };
    }

    // east component first: compass convention, not the mathematical angle
    dlon.atan2(dlat).to_degrees()
}

/// Normalises an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if d >= 360.0 { 0.0 } else { d }
}
