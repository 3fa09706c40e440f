//! Error types for projection operations.

use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    /// GeoKey directory is truncated or references data that is not present
    #[error("Invalid GeoKey directory: {0}")]
    InvalidDirectory(String),

    /// A key required to build the projection is absent
    #[error("Missing GeoKey {name} ({id})")]
    MissingKey { id: u16, name: &'static str },

    /// The keys resolve to a coordinate system this crate cannot express
    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    /// The projection library rejected the definition or a coordinate
    #[error("Projection failed: {0}")]
    Proj(String),
}
