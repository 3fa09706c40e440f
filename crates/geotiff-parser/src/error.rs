//! Error types for raster fetching and decoding.

use projection::ProjectionError;
use solar_common::{Classify, FailureClass, RasterShapeError};
use thiserror::Error;

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

#[derive(Debug, Error)]
pub enum RasterError {
    /// The imagery service answered with a non-success status
    #[error("Raster fetch failed with HTTP {status}: {body}")]
    FetchFailed { status: u16, body: String },

    /// Connection, timeout or body transfer failure
    #[error("Raster request failed: {0}")]
    Request(String),

    /// The layer URL could not be parsed
    #[error("Invalid raster URL: {0}")]
    InvalidUrl(String),

    /// The payload is not a readable GeoTIFF
    #[error("Failed to decode raster: {0}")]
    DecodeFailed(String),

    /// The GeoTIFF's coordinate system could not be resolved or projected
    #[error("Failed to project raster: {0}")]
    ProjectionFailed(#[from] ProjectionError),
}

impl RasterError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeFailed(msg.into())
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(e: tiff::TiffError) -> Self {
        Self::DecodeFailed(e.to_string())
    }
}

impl From<RasterShapeError> for RasterError {
    fn from(e: RasterShapeError) -> Self {
        Self::DecodeFailed(e.to_string())
    }
}

impl From<reqwest::Error> for RasterError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

impl Classify for RasterError {
    fn class(&self) -> FailureClass {
        match self {
            RasterError::FetchFailed { .. } | RasterError::Request(_) => FailureClass::Transient,
            RasterError::DecodeFailed(_) | RasterError::ProjectionFailed(_) => {
                FailureClass::Unavailable
            }
            RasterError::InvalidUrl(_) => FailureClass::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        let fetch = RasterError::FetchFailed {
            status: 403,
            body: "denied".to_string(),
        };
        assert_eq!(fetch.class(), FailureClass::Transient);
        assert_eq!(fetch.to_string(), "Raster fetch failed with HTTP 403: denied");
        assert_eq!(RasterError::decode("bad").class(), FailureClass::Unavailable);
        assert_eq!(
            RasterError::from(ProjectionError::UnsupportedCrs("x".into())).class(),
            FailureClass::Unavailable
        );
    }
}
