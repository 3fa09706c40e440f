//! Tests for capacity estimates.

use panel_layout::{max_panel_capacity, polygon_capacity, LayoutError};
use projection::spherical::compute_area;
use solar_common::{Classify, FailureClass};
use test_utils::bounds;

#[test]
fn test_reference_capacities() {
    assert_eq!(max_panel_capacity(0.0).unwrap(), 0);
    assert_eq!(max_panel_capacity(1000.0).unwrap(), 158);
    assert_eq!(max_panel_capacity(10_000.0).unwrap(), 1587);
}

#[test]
fn test_negative_area_is_caller_error() {
    let err = max_panel_capacity(-10.0).unwrap_err();
    assert_eq!(err, LayoutError::InvalidArea(-10.0));
    assert_eq!(err.class(), FailureClass::InvalidInput);
}

#[test]
fn test_capacity_is_monotonic() {
    let mut last = 0;
    for area in (0..5000).step_by(37) {
        let capacity = max_panel_capacity(area as f64).unwrap();
        assert!(capacity >= last);
        last = capacity;
    }
}

#[test]
fn test_polygon_capacity_matches_area() {
    let roof = bounds::PALO_ALTO.corners();
    let area = compute_area(&roof);
    // Roughly 106 m x 111 m.
    assert!(area > 11_000.0 && area < 12_500.0, "area = {}", area);
    assert_eq!(polygon_capacity(&roof).unwrap(), max_panel_capacity(area).unwrap());
}

#[test]
fn test_polygon_capacity_degenerate() {
    assert_eq!(polygon_capacity(&[]), Err(LayoutError::EmptyBoundary));
    let line = [bounds::SYDNEY.south_west(), bounds::SYDNEY.north_east()];
    assert_eq!(polygon_capacity(&line).unwrap(), 0);
}
