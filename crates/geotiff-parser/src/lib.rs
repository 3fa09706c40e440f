//! GeoTIFF layer fetching and decoding.
//!
//! Layer rasters arrive as GeoTIFFs in whatever coordinate system the
//! imagery service chose (usually UTM). This crate downloads them, decodes
//! every band to `f32`, and resolves the WGS84 bounding box needed to place
//! the raster on a map.

pub mod decode;
pub mod error;
pub mod fetch;
pub mod georef;

pub use decode::decode_geotiff;
pub use error::{RasterError, RasterResult};
pub use fetch::{FetchConfig, RasterFetcher, DEFAULT_IMAGERY_HOST};
pub use georef::{Georeference, NativeBounds};
