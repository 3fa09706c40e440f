//! Common types shared across the solar raster and panel layout crates.

pub mod error;
pub mod geo;
pub mod raster;

pub use error::{Classify, FailureClass};
pub use geo::{GeoPoint, GeoRectangle};
pub use raster::{GeoRaster, RasterShapeError};
