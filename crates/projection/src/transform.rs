//! Forward projection from a raster's native CRS to WGS84 degrees.

use proj4rs::proj::Proj;
use solar_common::{GeoPoint, GeoRectangle};
use tracing::debug;

use crate::definition::{CrsKind, ProjectionDefinition, WGS84};
use crate::error::{ProjectionError, ProjectionResult};

/// Reusable transformer for one source definition.
pub struct GeoTransformer {
    source: Proj,
    target: Proj,
    kind: CrsKind,
    x_scale: f64,
    y_scale: f64,
}

impl std::fmt::Debug for GeoTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoTransformer")
            .field("kind", &self.kind)
            .field("x_scale", &self.x_scale)
            .field("y_scale", &self.y_scale)
            .finish_non_exhaustive()
    }
}

impl GeoTransformer {
    pub fn new(definition: &ProjectionDefinition) -> ProjectionResult<Self> {
        debug!(proj4 = %definition.proj4, "Initializing projection");
        let source = Proj::from_proj_string(&definition.proj4)
            .map_err(|e| ProjectionError::Proj(format!("{}: {:?}", definition.proj4, e)))?;
        let target = Proj::from_proj_string(WGS84)
            .map_err(|e| ProjectionError::Proj(format!("{}: {:?}", WGS84, e)))?;

        Ok(Self {
            source,
            target,
            kind: definition.kind,
            x_scale: definition.x_scale,
            y_scale: definition.y_scale,
        })
    }

    /// Project a native coordinate (in the raster's own units) to WGS84.
    pub fn forward(&self, x: f64, y: f64) -> ProjectionResult<GeoPoint> {
        let x = x * self.x_scale;
        let y = y * self.y_scale;

        // proj4rs works in radians on the geographic side.
        let mut point = match self.kind {
            CrsKind::Geographic => (x.to_radians(), y.to_radians(), 0.0),
            CrsKind::Projected => (x, y, 0.0),
        };
        proj4rs::transform::transform(&self.source, &self.target, &mut point)
            .map_err(|e| ProjectionError::Proj(format!("({}, {}): {:?}", x, y, e)))?;

        let lng = point.0.to_degrees();
        let lat = point.1.to_degrees();
        if !lat.is_finite() || !lng.is_finite() {
            return Err(ProjectionError::Proj(format!(
                "({}, {}) has no WGS84 equivalent",
                x, y
            )));
        }
        Ok(GeoPoint::new(lat, lng))
    }

    /// Project a native bounding box by its south-west and north-east corners.
    pub fn project_bounds(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> ProjectionResult<GeoRectangle> {
        let south_west = self.forward(min_x, min_y)?;
        let north_east = self.forward(max_x, max_y)?;
        Ok(GeoRectangle::from_corners(south_west, north_east))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_identity() {
        let def = ProjectionDefinition::from_epsg(4326).unwrap();
        let transformer = GeoTransformer::new(&def).unwrap();
        let p = transformer.forward(-122.139, 37.445).unwrap();
        assert!((p.lat - 37.445).abs() < 1e-9);
        assert!((p.lng + 122.139).abs() < 1e-9);
    }

    #[test]
    fn test_web_mercator_origin() {
        let def = ProjectionDefinition::from_epsg(3857).unwrap();
        let transformer = GeoTransformer::new(&def).unwrap();
        let p = transformer.forward(0.0, 0.0).unwrap();
        assert!(p.lat.abs() < 1e-9);
        assert!(p.lng.abs() < 1e-9);
    }
}
