//! Panel layout and capacity handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use metrics::counter;
use panel_layout::{ColumnPlacement, LayoutError, PanelGrid, PanelLayout, MAX_LAYOUT_PANELS};
use projection::spherical::compute_area;
use serde::{Deserialize, Serialize};
use solar_common::{GeoPoint, GeoRectangle};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelsRequest {
    /// Drawn roof or lot outline. Without it the closest building's
    /// bounding box is used.
    #[serde(default)]
    pub boundary: Option<Vec<GeoPoint>>,
    /// Grid anchor; also where to look up the building when no boundary
    /// is given
    #[serde(default)]
    pub center: Option<GeoPoint>,
    pub count: u32,
    #[serde(default)]
    pub placement: Option<ColumnPlacement>,
}

/// Where the layout boundary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundarySource {
    Drawn,
    Building,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelsResponse {
    pub source: BoundarySource,
    pub anchor: GeoPoint,
    /// Panels the boundary can hold
    pub capacity: u32,
    pub requested: u32,
    #[serde(flatten)]
    pub layout: PanelLayout,
}

/// POST /api/panels
#[instrument(skip(state, request), fields(count = request.count))]
pub async fn panels_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<PanelsRequest>,
) -> Result<Json<PanelsResponse>, ApiError> {
    counter!("api_requests_total", "endpoint" => "panels").increment(1);
    // Checked before any Solar API lookup.
    if request.count > MAX_LAYOUT_PANELS {
        return Err(LayoutError::TooManyPanels {
            requested: request.count,
            max: MAX_LAYOUT_PANELS,
        }
        .into());
    }
    let spec = state.config.panels;

    let (source, boundary, anchor, capacity) = match (request.boundary, request.center) {
        (Some(boundary), center) => {
            let anchor = center
                .or_else(|| GeoRectangle::enclosing(&boundary).map(|r| r.center()))
                .ok_or(LayoutError::EmptyBoundary)?;
            let capacity = spec.polygon_capacity(&boundary)?;
            (BoundarySource::Drawn, boundary, anchor, capacity)
        }
        (None, Some(center)) => {
            if !center.is_valid() {
                return Err(ApiError::BadRequest(format!(
                    "invalid center {}, {}",
                    center.lat, center.lng
                )));
            }
            let building = state.solar.building_insights(center).await?;
            let rect = building.bounds();
            let capacity = match building.roof_area_m2() {
                Some(area) => spec.capacity(area)?,
                None => spec.polygon_capacity(&rect.corners())?,
            };
            (
                BoundarySource::Building,
                rect.corners().to_vec(),
                building.center_point(),
                capacity,
            )
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either boundary or center is required".to_string(),
            ))
        }
    };

    let grid = PanelGrid::new(spec)
        .with_placement(request.placement.unwrap_or(state.config.column_placement));
    let layout = grid.layout(&boundary, request.count, anchor)?;

    info!(
        source = ?source,
        requested = request.count,
        placed = layout.len(),
        capacity,
        "Panel layout computed"
    );

    Ok(Json(PanelsResponse {
        source,
        anchor,
        capacity,
        requested: request.count,
        layout,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CapacityQuery {
    pub area_m2: f64,
}

#[derive(Debug, Deserialize)]
pub struct CapacityRequest {
    pub boundary: Vec<GeoPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityResponse {
    pub area_m2: f64,
    pub capacity: u32,
}

/// GET /api/capacity?area_m2=
pub async fn capacity_area_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<CapacityQuery>,
) -> Result<Json<CapacityResponse>, ApiError> {
    counter!("api_requests_total", "endpoint" => "capacity").increment(1);
    let capacity = state.config.panels.capacity(query.area_m2)?;
    Ok(Json(CapacityResponse {
        area_m2: query.area_m2,
        capacity,
    }))
}

/// POST /api/capacity with a polygon
pub async fn capacity_polygon_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<CapacityRequest>,
) -> Result<Json<CapacityResponse>, ApiError> {
    counter!("api_requests_total", "endpoint" => "capacity").increment(1);
    let capacity = state.config.panels.polygon_capacity(&request.boundary)?;
    Ok(Json(CapacityResponse {
        area_m2: compute_area(&request.boundary),
        capacity,
    }))
}
