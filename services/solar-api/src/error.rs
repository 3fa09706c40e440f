//! Service error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use panel_layout::LayoutError;
use renderer::RenderError;
use serde::Serialize;
use solar_common::{Classify, FailureClass};
use thiserror::Error;

use crate::layers::LayerKind;

/// Failures talking to the Solar API.
#[derive(Debug, Error)]
pub enum SolarApiError {
    /// Non-success response; the body is kept verbatim
    #[error("Solar API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Solar API request failed: {0}")]
    Request(String),

    #[error("Unexpected Solar API response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SolarApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

impl Classify for SolarApiError {
    fn class(&self) -> FailureClass {
        match self {
            // 404 means there is no imagery for the location.
            SolarApiError::Status { status: 404, .. } => FailureClass::Unavailable,
            SolarApiError::Status { .. } | SolarApiError::Request(_) => FailureClass::Transient,
            SolarApiError::Decode(_) => FailureClass::Unavailable,
        }
    }
}

/// Why an overlay could not be produced.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A layer the render needs did not load
    #[error("Layer {layer} unavailable: {reason}")]
    DependencyUnavailable {
        layer: LayerKind,
        /// Class of the underlying fetch or decode failure
        class: FailureClass,
        reason: String,
    },

    /// The service did not ask for the layer, or the Solar API has no URL for it
    #[error("Layer {0} was not fetched")]
    NotFetched(LayerKind),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl Classify for OverlayError {
    fn class(&self) -> FailureClass {
        match self {
            OverlayError::DependencyUnavailable { class, .. } => match class {
                FailureClass::Transient => FailureClass::Transient,
                _ => FailureClass::Unavailable,
            },
            OverlayError::NotFetched(_) => FailureClass::Unavailable,
            OverlayError::Render(e) => e.class(),
        }
    }
}

/// Error returned from handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    SolarApi(#[from] SolarApiError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// `None` for internal errors, which have no caller-facing class.
    pub fn class(&self) -> Option<FailureClass> {
        match self {
            ApiError::BadRequest(_) => Some(FailureClass::InvalidInput),
            ApiError::SolarApi(e) => Some(e.class()),
            ApiError::Overlay(e) => Some(e.class()),
            ApiError::Layout(e) => Some(e.class()),
            ApiError::Internal(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.class()
            .and_then(|class| StatusCode::from_u16(class.http_status_code()).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<FailureClass>,
    pub retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let class = self.class();
        let body = ErrorBody {
            error: self.to_string(),
            class,
            retryable: class.map(|c| c.is_retryable()).unwrap_or(false),
        };
        (status, Json(body)).into_response()
    }
}
