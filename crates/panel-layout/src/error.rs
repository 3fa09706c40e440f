//! Error types for capacity and layout calculations.

use solar_common::{Classify, FailureClass};
use thiserror::Error;

pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Area must be a finite, non-negative number of square metres, got {0}")]
    InvalidArea(f64),

    #[error("Layout boundary has no points")]
    EmptyBoundary,

    /// The boundary is narrower than a single panel column
    #[error("Boundary is {width_m:.2} m wide, at least {required_m:.2} m is needed for one column")]
    InsufficientWidth { width_m: f64, required_m: f64 },

    #[error("Cannot lay out {requested} panels, at most {max} per layout")]
    TooManyPanels { requested: u32, max: u32 },

    #[error("Invalid panel spec: {0}")]
    InvalidSpec(String),
}

impl Classify for LayoutError {
    fn class(&self) -> FailureClass {
        FailureClass::InvalidInput
    }
}
