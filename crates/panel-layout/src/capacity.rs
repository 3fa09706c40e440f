//! Panel capacity estimates.

use projection::spherical::compute_area;
use solar_common::GeoPoint;

use crate::error::{LayoutError, LayoutResult};
use crate::spec::PanelSpec;

/// Panels that fit in `area_m2` with the default [`PanelSpec`].
///
/// `floor(area * 0.5 / (2.1 * 1.5))`, so 1000 m² holds 158 panels.
pub fn max_panel_capacity(area_m2: f64) -> LayoutResult<u32> {
    PanelSpec::default().capacity(area_m2)
}

/// Capacity of the spherical area enclosed by `boundary`.
pub fn polygon_capacity(boundary: &[GeoPoint]) -> LayoutResult<u32> {
    PanelSpec::default().polygon_capacity(boundary)
}

impl PanelSpec {
    pub fn capacity(&self, area_m2: f64) -> LayoutResult<u32> {
        if !area_m2.is_finite() || area_m2 < 0.0 {
            return Err(LayoutError::InvalidArea(area_m2));
        }
        self.validate()?;

        let usable = area_m2 * self.usable_ratio;
        // Saturates at u32::MAX for absurdly large areas.
        Ok((usable / self.footprint_area()).floor() as u32)
    }

    pub fn polygon_capacity(&self, boundary: &[GeoPoint]) -> LayoutResult<u32> {
        if boundary.is_empty() {
            return Err(LayoutError::EmptyBoundary);
        }
        self.capacity(compute_area(boundary))
    }
}
