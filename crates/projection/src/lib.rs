//! Coordinate reference system handling.
//!
//! - [`geokeys`]: GeoTIFF GeoKey directory parsing
//! - [`definition`]: GeoKeys → concrete projection definition (PROJ string + unit factors)
//! - [`transform`]: forward projection of native coordinates to WGS84
//! - [`spherical`]: great-circle distance, offset, heading and area on a spherical Earth

pub mod definition;
pub mod error;
pub mod geokeys;
pub mod spherical;
pub mod transform;

pub use definition::{CrsKind, ProjectionDefinition};
pub use error::{ProjectionError, ProjectionResult};
pub use geokeys::{GeoKeyDirectory, GeoKeyValue};
pub use transform::GeoTransformer;
