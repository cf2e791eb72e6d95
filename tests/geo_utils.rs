//! Tests for geo_utils module

use geo::Coord;
use std::f64::consts::{FRAC_PI_2, PI};
use trackprep::geo_utils::*;

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn lnglat(lng: f64, lat: f64) -> Coord<f64> {
    Coord { x: lng, y: lat }
}

#[test]
fn test_haversine_distance_same_point() {
    let p = lnglat(-0.1278, 51.5074);
    assert_eq!(haversine_distance(&p, &p), 0.0);
}

#[test]
fn test_haversine_distance_known_value() {
    // London to Paris is approximately 344 km
    let london = lnglat(-0.1278, 51.5074);
    let paris = lnglat(2.3522, 48.8566);
    let dist = haversine_distance(&london, &paris);
    assert!(approx_eq(dist, 343_560.0, 5000.0)); // Within 5km
}

#[test]
fn test_planar_distance() {
    assert_eq!(
        planar_distance(&Coord { x: 1.0, y: 1.0 }, &Coord { x: 4.0, y: 5.0 }),
        5.0
    );
}

#[test]
fn test_planar_heading() {
    let origin = Coord { x: 0.0, y: 0.0 };
    assert_eq!(planar_heading(&origin, &Coord { x: 1.0, y: 0.0 }), 0.0);
    assert!(approx_eq(
        planar_heading(&origin, &Coord { x: 0.0, y: 2.0 }),
        FRAC_PI_2,
        1e-12
    ));
}

#[test]
fn test_initial_bearing_cardinal() {
    let origin = lnglat(0.0, 0.0);
    assert!(approx_eq(initial_bearing(&origin, &lnglat(0.0, 1.0)), 0.0, 1e-9));
    assert!(approx_eq(initial_bearing(&origin, &lnglat(1.0, 0.0)), FRAC_PI_2, 1e-9));
    assert!(approx_eq(initial_bearing(&origin, &lnglat(0.0, -1.0)).abs(), PI, 1e-9));
}

#[test]
fn test_wrap_angle() {
    assert!(approx_eq(wrap_angle(3.0 * PI / 2.0), -FRAC_PI_2, 1e-12));
    assert!(approx_eq(wrap_angle(-3.0 * PI / 2.0), FRAC_PI_2, 1e-12));
    assert_eq!(wrap_angle(0.0), 0.0);
    assert!(approx_eq(wrap_angle(-PI), PI, 1e-12));
}
