//! Distance and heading helpers.
//!
//! Planar helpers work in the units of projected coordinates (usually
//! metres for UTM). Geographic helpers take `x` as longitude and `y` as
//! latitude in degrees and return metres and radians.

use geo::Coord;
use std::f64::consts::PI;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Euclidean distance between two projected coordinates.
pub fn planar_distance(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Heading from `a` to `b` in radians, counter-clockwise from the x axis.
pub fn planar_heading(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Great-circle distance in meters.
pub fn haversine_distance(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let dlat = (b.y - a.y).to_radians();
    let dlng = (b.x - a.x).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial great-circle bearing from `a` to `b` in radians, clockwise from north.
pub fn initial_bearing(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let dlng = (b.x - a.x).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    y.atan2(x)
}

/// Wrap an angle into (-pi, pi].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}
