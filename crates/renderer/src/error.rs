//! Error types for palette building, compositing and encoding.

use solar_common::{Classify, FailureClass, RasterShapeError};
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// A palette anchor is not a 6-digit hex color, or no anchors were given
    #[error("Invalid color format: {0}")]
    InvalidColorFormat(String),

    /// The raster does not have the band the render needs
    #[error("Raster has {available} band(s), band {index} is required")]
    MissingBand { index: usize, available: usize },

    /// Intermediate raster could not be assembled
    #[error("Invalid raster shape: {0}")]
    Shape(String),

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl From<RasterShapeError> for RenderError {
    fn from(e: RasterShapeError) -> Self {
        Self::Shape(e.to_string())
    }
}

impl Classify for RenderError {
    fn class(&self) -> FailureClass {
        match self {
            RenderError::InvalidColorFormat(_) | RenderError::MissingBand { .. } => {
                FailureClass::InvalidInput
            }
            RenderError::Shape(_) | RenderError::Encode(_) => FailureClass::Unavailable,
        }
    }
}
