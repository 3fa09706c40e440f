//! Decoded geo-referenced raster tiles.

use thiserror::Error;

use crate::geo::GeoRectangle;

/// A decoded raster tile with one or more bands and WGS84 bounds.
///
/// Bands are row-major planes of `width * height` samples. The raster is
/// immutable once built; construct a new one to change anything.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRaster {
    width: usize,
    height: usize,
    bands: Vec<Vec<f32>>,
    bounds: GeoRectangle,
}

#[derive(Debug, Error, PartialEq)]
pub enum RasterShapeError {
    #[error("Raster dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },

    #[error("Raster has no bands")]
    NoBands,

    /// North must exceed south and east must exceed west
    #[error("Raster bounds are not ordered: {0:?}")]
    InvertedBounds(GeoRectangle),

    #[error("Band {band} has {actual} samples, expected {expected}")]
    BandLength {
        band: usize,
        expected: usize,
        actual: usize,
    },
}

impl GeoRaster {
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<Vec<f32>>,
        bounds: GeoRectangle,
    ) -> Result<Self, RasterShapeError> {
        if width == 0 || height == 0 {
            return Err(RasterShapeError::EmptyDimensions { width, height });
        }
        if bands.is_empty() {
            return Err(RasterShapeError::NoBands);
        }
        if !bounds.is_well_ordered() {
            return Err(RasterShapeError::InvertedBounds(bounds));
        }
        let expected = width * height;
        if let Some((band, plane)) = bands.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(RasterShapeError::BandLength {
                band,
                expected,
                actual: plane.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bands,
            bounds,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> Option<&[f32]> {
        self.bands.get(index).map(Vec::as_slice)
    }

    pub fn bands(&self) -> &[Vec<f32>] {
        &self.bands
    }

    pub fn bounds(&self) -> GeoRectangle {
        self.bounds
    }

    /// Sample at (x, y) in the given band.
    pub fn sample(&self, band: usize, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.band(band).map(|b| b[y * self.width + x])
    }

    /// Same pixel grid and bounds, different bands.
    pub fn with_bands(&self, bands: Vec<Vec<f32>>) -> Result<Self, RasterShapeError> {
        Self::new(self.width, self.height, bands, self.bounds)
    }
}
