//! Grid layout of panel footprints.
//!
//! The grid is sized from the boundary's bounding rectangle: the rectangle's
//! northern edge sets how many columns fit, the desired count sets the rows.
//! Panels are then placed around an anchor point (usually the building
//! center), row by row from south to north.

use projection::spherical::{compute_offset, distance_between};
use serde::{Deserialize, Serialize};
use solar_common::{GeoPoint, GeoRectangle};
use tracing::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::spec::PanelSpec;

/// Largest panel count a single layout will place.
pub const MAX_LAYOUT_PANELS: u32 = 10_000;

const NORTH: f64 = 0.0;
const EAST: f64 = 90.0;
const SOUTH: f64 = 180.0;
const WEST: f64 = -90.0;

/// How panels in the same row are positioned east-west.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPlacement {
    /// Columns step east by the column pitch, centered on the anchor.
    #[default]
    Spread,
    /// Every column shares the row center. Reproduces layouts recorded before
    /// columns were offset.
    Stacked,
}

/// Ground outline of one panel: NW, NE, SE, SW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelFootprint {
    corners: [GeoPoint; 4],
}

impl PanelFootprint {
    /// Footprint of a panel centered on `center`.
    pub fn around(center: GeoPoint, width_m: f64, height_m: f64) -> Self {
        let north = compute_offset(center, height_m / 2.0, NORTH);
        let south = compute_offset(center, height_m / 2.0, SOUTH);
        Self {
            corners: [
                compute_offset(north, width_m / 2.0, WEST),
                compute_offset(north, width_m / 2.0, EAST),
                compute_offset(south, width_m / 2.0, EAST),
                compute_offset(south, width_m / 2.0, WEST),
            ],
        }
    }

    pub fn corners(&self) -> &[GeoPoint; 4] {
        &self.corners
    }

    pub fn north_west(&self) -> GeoPoint {
        self.corners[0]
    }

    pub fn north_east(&self) -> GeoPoint {
        self.corners[1]
    }

    pub fn south_east(&self) -> GeoPoint {
        self.corners[2]
    }

    pub fn south_west(&self) -> GeoPoint {
        self.corners[3]
    }

    pub fn center(&self) -> GeoPoint {
        let (lat, lng) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
        GeoPoint::new(lat / 4.0, lng / 4.0)
    }
}

/// Footprints in row-major order plus the grid they were cut from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelLayout {
    pub rows: u32,
    pub columns: u32,
    /// East-west extent of the boundary's bounding rectangle, metres
    pub width_m: f64,
    /// North-south extent of the boundary's bounding rectangle, metres
    pub height_m: f64,
    pub footprints: Vec<PanelFootprint>,
}

impl PanelLayout {
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanelFootprint> {
        self.footprints.iter()
    }
}

/// Lay out `desired` panels within `boundary` around `anchor`, using the
/// default [`PanelSpec`] and spread columns.
pub fn layout_panels(
    boundary: &[GeoPoint],
    desired: u32,
    anchor: GeoPoint,
) -> LayoutResult<PanelLayout> {
    PanelGrid::default().layout(boundary, desired, anchor)
}

/// [`layout_panels`] over a rectangle, for when only a roof or lot bounding
/// box is known.
pub fn layout_panels_in_rectangle(
    rect: &GeoRectangle,
    desired: u32,
    anchor: GeoPoint,
) -> LayoutResult<PanelLayout> {
    layout_panels(&rect.corners(), desired, anchor)
}

/// Layout engine configuration. Holds no state between calls.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanelGrid {
    spec: PanelSpec,
    placement: ColumnPlacement,
}

impl PanelGrid {
    pub fn new(spec: PanelSpec) -> Self {
        Self {
            spec,
            placement: ColumnPlacement::default(),
        }
    }

    pub fn with_placement(mut self, placement: ColumnPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn spec(&self) -> &PanelSpec {
        &self.spec
    }

    pub fn placement(&self) -> ColumnPlacement {
        self.placement
    }

    pub fn layout(
        &self,
        boundary: &[GeoPoint],
        desired: u32,
        anchor: GeoPoint,
    ) -> LayoutResult<PanelLayout> {
        if desired > MAX_LAYOUT_PANELS {
            return Err(LayoutError::TooManyPanels {
                requested: desired,
                max: MAX_LAYOUT_PANELS,
            });
        }
        self.spec.validate()?;
        let rect = GeoRectangle::enclosing(boundary).ok_or(LayoutError::EmptyBoundary)?;

        let top_left = rect.north_west();
        let width_m = distance_between(top_left, rect.north_east());
        let height_m = distance_between(top_left, rect.south_west());

        let column_pitch = self.spec.column_pitch();
        let row_pitch = self.spec.row_pitch();

        // NaN widths from malformed points cast to 0 as well.
        let columns = (width_m / column_pitch).floor() as u32;
        if columns < 1 {
            return Err(LayoutError::InsufficientWidth {
                width_m,
                required_m: column_pitch,
            });
        }
        let rows = desired.div_ceil(columns);

        let mut footprints = Vec::with_capacity(desired as usize);
        'rows: for row in 0..rows {
            let north_m = (row as f64 - rows as f64 / 2.0) * row_pitch;
            let row_center = compute_offset(anchor, north_m, NORTH);

            for column in 0..columns {
                if footprints.len() >= desired as usize {
                    break 'rows;
                }
                let center = match self.placement {
                    ColumnPlacement::Spread => {
                        let east_m = (column as f64 - columns as f64 / 2.0) * column_pitch;
                        compute_offset(row_center, east_m, EAST)
                    }
                    ColumnPlacement::Stacked => row_center,
                };
                footprints.push(PanelFootprint::around(
                    center,
                    self.spec.width_m,
                    self.spec.height_m,
                ));
            }
        }

        debug!(
            rows,
            columns,
            width_m,
            height_m,
            desired,
            placed = footprints.len(),
            placement = ?self.placement,
            "Laid out panel grid"
        );

        Ok(PanelLayout {
            rows,
            columns,
            width_m,
            height_m,
            footprints,
        })
    }
}
