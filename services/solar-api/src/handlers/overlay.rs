//! Layer overlay handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use metrics::counter;
use renderer::ValueRange;
use serde::{Deserialize, Serialize};
use solar_common::{GeoPoint, GeoRectangle};
use tracing::instrument;

use crate::error::{ApiError, OverlayError};
use crate::layers::{fetch_layers, render_overlay, LayerKind, LayerRequest, OverlayOptions};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OverlayQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_layer")]
    pub layer: LayerKind,
    /// Mask the overlay to the roof
    #[serde(default)]
    pub roof_only: bool,
    /// 1-12, for monthly flux
    #[serde(default)]
    pub month: Option<usize>,
}

fn default_layer() -> LayerKind {
    LayerKind::AnnualFlux
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayResponse {
    pub layer: LayerKind,
    /// Where to anchor the image on the map
    pub bounds: GeoRectangle,
    pub opacity: f32,
    pub width: usize,
    pub height: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
    pub masked: bool,
    /// PNG data URI
    pub image: String,
}

impl OverlayQuery {
    fn options(&self) -> Result<OverlayOptions, ApiError> {
        let band = match (self.layer, self.month) {
            (LayerKind::MonthlyFlux, Some(month)) if (1..=12).contains(&month) => month - 1,
            (LayerKind::MonthlyFlux, Some(month)) => {
                return Err(ApiError::BadRequest(format!(
                    "month must be between 1 and 12, got {}",
                    month
                )))
            }
            _ => 0,
        };
        Ok(OverlayOptions {
            roof_only: self.roof_only,
            band,
        })
    }
}

/// GET /api/overlay?lat=&lng=&layer=&roof_only=&month=
#[instrument(skip(state), fields(layer = %query.layer))]
pub async fn overlay_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<OverlayQuery>,
) -> Result<Json<OverlayResponse>, ApiError> {
    counter!("api_requests_total", "endpoint" => "overlay").increment(1);

    let center = GeoPoint::new(query.lat, query.lng);
    if !center.is_valid() {
        return Err(ApiError::BadRequest(format!(
            "invalid location {}, {}",
            query.lat, query.lng
        )));
    }
    let options = query.options()?;
    let kind = query.layer;

    let urls = state
        .solar
        .data_layers(center, state.config.radius_meters)
        .await?;
    let layers = fetch_layers(&state.fetcher, &urls, LayerRequest::for_kind(kind)).await;

    // Compositing and PNG encoding are CPU-bound.
    let render_state = Arc::clone(&state);
    let (overlay, image) = tokio::task::spawn_blocking(move || {
        let overlay = render_overlay(&layers, kind, options, &render_state.config)?;
        let image = overlay.surface.to_data_uri()?;
        Ok::<_, OverlayError>((overlay, image))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("render task failed: {}", e)))??;

    Ok(Json(OverlayResponse {
        layer: overlay.layer,
        bounds: overlay.bounds,
        opacity: overlay.opacity,
        width: overlay.surface.width(),
        height: overlay.surface.height(),
        range: overlay.range,
        masked: overlay.masked,
        image,
    }))
}
