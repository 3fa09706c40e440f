//! Geographic point and rectangle types.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates are finite and inside the valid lat/lng ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// An axis-aligned geographic rectangle in decimal degrees.
///
/// Assumes `north > south` and `east > west`. Rectangles crossing the
/// antimeridian are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRectangle {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoRectangle {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Build a rectangle from its south-west and north-east corners.
    pub fn from_corners(south_west: GeoPoint, north_east: GeoPoint) -> Self {
        Self {
            north: north_east.lat,
            south: south_west.lat,
            east: north_east.lng,
            west: south_west.lng,
        }
    }

    /// Smallest rectangle enclosing every point, or `None` for an empty input.
    pub fn enclosing<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self::new(first.lat, first.lat, first.lng, first.lng);
        for p in iter {
            rect.north = rect.north.max(p.lat);
            rect.south = rect.south.min(p.lat);
            rect.east = rect.east.max(p.lng);
            rect.west = rect.west.min(p.lng);
        }
        Some(rect)
    }

    pub fn north_east(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.east)
    }

    pub fn north_west(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.west)
    }

    pub fn south_east(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.east)
    }

    pub fn south_west(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.west)
    }

    /// Corners in clockwise order starting at the north-west corner.
    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            self.north_west(),
            self.north_east(),
            self.south_east(),
            self.south_west(),
        ]
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// True when north > south and east > west with finite values.
    pub fn is_well_ordered(&self) -> bool {
        [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
            && self.north > self.south
            && self.east > self.west
    }
}
