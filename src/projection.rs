//! Spherical Web Mercator (EPSG:3857), the projection of standard tile maps.

use crate::polyline::Coord;

/// WGS84 semi-major axis in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude where Web Mercator tiles end.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Projects `(lng, lat)` degrees into Web Mercator meters `(x, y)`.
pub fn web_mercator((lng, lat): Coord) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS_M * lng.to_radians();
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Inverse of [`web_mercator`].
pub fn from_web_mercator((x, y): (f64, f64)) -> Coord {
    let lng = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lng, lat)
}
