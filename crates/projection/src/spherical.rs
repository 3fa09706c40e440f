//! Geometry on a spherical Earth.
//!
//! Distances are in metres and angles in degrees. All functions use the
//! WGS84 semi-major axis as the sphere radius.

use solar_common::GeoPoint;
use std::f64::consts::FRAC_PI_2;

/// Radius of the sphere, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Great-circle distance between two points (haversine formula).
pub fn distance_between(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Point reached by travelling `distance_m` from `from` along initial bearing
/// `heading_deg` (clockwise from north).
pub fn compute_offset(from: GeoPoint, distance_m: f64, heading_deg: f64) -> GeoPoint {
    let angular = distance_m / EARTH_RADIUS_M;
    let heading = heading_deg.to_radians();
    let lat = from.lat.to_radians();
    let lng = from.lng.to_radians();

    let (sin_d, cos_d) = angular.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let sin_lat2 = cos_d * sin_lat + sin_d * cos_lat * heading.cos();
    let delta_lng = (sin_d * cos_lat * heading.sin()).atan2(cos_d - sin_lat * sin_lat2);

    GeoPoint::new(
        sin_lat2.clamp(-1.0, 1.0).asin().to_degrees(),
        (lng + delta_lng).to_degrees(),
    )
}

/// Initial bearing from `from` to `to`, in degrees within `[-180, 180)`.
pub fn compute_heading(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let heading = (delta_lng.sin() * lat2.cos())
        .atan2(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos());
    wrap(heading.to_degrees(), -180.0, 180.0)
}

/// Unsigned area of a closed path, in square metres. Paths with fewer than
/// three points have no area.
pub fn compute_area(path: &[GeoPoint]) -> f64 {
    compute_signed_area(path).abs()
}

/// Signed area of a closed path; counter-clockwise paths are positive.
pub fn compute_signed_area(path: &[GeoPoint]) -> f64 {
    let Some(last) = path.last() else {
        return 0.0;
    };
    if path.len() < 3 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut prev_tan_lat = ((FRAC_PI_2 - last.lat.to_radians()) / 2.0).tan();
    let mut prev_lng = last.lng.to_radians();
    for point in path {
        let tan_lat = ((FRAC_PI_2 - point.lat.to_radians()) / 2.0).tan();
        let lng = point.lng.to_radians();
        total += polar_triangle_area(tan_lat, lng, prev_tan_lat, prev_lng);
        prev_tan_lat = tan_lat;
        prev_lng = lng;
    }
    total * EARTH_RADIUS_M * EARTH_RADIUS_M
}

// Signed area of the triangle (pole, p1, p2) on the unit sphere.
fn polar_triangle_area(tan1: f64, lng1: f64, tan2: f64, lng2: f64) -> f64 {
    let delta_lng = lng1 - lng2;
    let t = tan1 * tan2;
    2.0 * (t * delta_lng.sin()).atan2(1.0 + t * delta_lng.cos())
}

fn wrap(value: f64, min: f64, max: f64) -> f64 {
    if value >= min && value < max {
        value
    } else {
        (value - min).rem_euclid(max - min) + min
    }
}
