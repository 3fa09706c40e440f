//! Raster-to-model georeferencing.
//!
//! A GeoTIFF places its pixel grid in model space either with a tiepoint
//! plus pixel scale, or with a full 4x4 affine ModelTransformation matrix.

use nalgebra::{Matrix4, Vector4};

use crate::error::{RasterError, RasterResult};

/// Axis-aligned extent of the raster in native model coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl NativeBounds {
    fn enclosing(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let mut bounds = Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        };
        for (x, y) in iter {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        Some(bounds)
    }

    pub fn is_finite(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// How pixel space maps into model space.
#[derive(Debug, Clone, PartialEq)]
pub enum Georeference {
    /// Pixel (i, j) sits at model (x, y); pixels are `scale_x` wide and
    /// `scale_y` tall with rows running south.
    Tiepoint {
        i: f64,
        j: f64,
        x: f64,
        y: f64,
        scale_x: f64,
        scale_y: f64,
    },
    /// Row-major affine matrix mapping (i, j, 0, 1) to (x, y, z, 1).
    Affine(Matrix4<f64>),
}

impl Georeference {
    /// Build from the raw tag values, preferring the affine matrix.
    pub fn from_tags(
        tiepoints: Option<&[f64]>,
        pixel_scale: Option<&[f64]>,
        transformation: Option<&[f64]>,
    ) -> RasterResult<Self> {
        if let Some(matrix) = transformation {
            if matrix.len() != 16 {
                return Err(RasterError::decode(format!(
                    "ModelTransformation has {} values, expected 16",
                    matrix.len()
                )));
            }
            return Ok(Georeference::Affine(Matrix4::from_row_slice(matrix)));
        }

        match (tiepoints, pixel_scale) {
            (Some(tie), Some(scale)) if tie.len() >= 6 && scale.len() >= 2 => {
                if scale[0] == 0.0 || scale[1] == 0.0 {
                    return Err(RasterError::decode("ModelPixelScale has a zero component"));
                }
                Ok(Georeference::Tiepoint {
                    i: tie[0],
                    j: tie[1],
                    x: tie[3],
                    y: tie[4],
                    scale_x: scale[0],
                    scale_y: scale[1],
                })
            }
            (Some(_), Some(_)) => Err(RasterError::decode(
                "ModelTiepoint or ModelPixelScale is truncated",
            )),
            _ => Err(RasterError::decode("GeoTIFF has no georeferencing tags")),
        }
    }

    /// Model coordinate of a pixel-space location.
    pub fn to_model(&self, col: f64, row: f64) -> (f64, f64) {
        match self {
            Georeference::Tiepoint {
                i,
                j,
                x,
                y,
                scale_x,
                scale_y,
            } => (x + (col - i) * scale_x, y - (row - j) * scale_y),
            Georeference::Affine(matrix) => {
                let model = matrix * Vector4::new(col, row, 0.0, 1.0);
                (model.x, model.y)
            }
        }
    }

    /// Extent of a `width` x `height` grid, taken over all four corners.
    pub fn bounds(&self, width: usize, height: usize) -> RasterResult<NativeBounds> {
        let (w, h) = (width as f64, height as f64);
        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
            .map(|(col, row)| self.to_model(col, row));
        NativeBounds::enclosing(corners)
            .filter(NativeBounds::is_finite)
            .ok_or_else(|| RasterError::decode("georeferencing produced non-finite bounds"))
    }
}
