//! Failure classification shared by every crate's error type.

use serde::Serialize;

/// How a caller should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Transport or upstream HTTP failure. Surface "data unavailable", may retry.
    Transient,
    /// Malformed or unsupported upstream data. Surface "layer unavailable", do not retry.
    Unavailable,
    /// Caller passed invalid arguments. Fail fast.
    InvalidInput,
}

impl FailureClass {
    /// HTTP status code used when this failure crosses the service boundary.
    pub fn http_status_code(&self) -> u16 {
        match self {
            FailureClass::Transient => 502,
            FailureClass::Unavailable => 424,
            FailureClass::InvalidInput => 400,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureClass::Transient)
    }
}

/// Implemented by error types that can be classified into a [`FailureClass`].
pub trait Classify {
    fn class(&self) -> FailureClass;
}
