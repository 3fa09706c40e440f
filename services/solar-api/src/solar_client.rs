//! Client for the Solar API's `dataLayers:get` and
//! `buildingInsights:findClosest` endpoints.
//!
//! Only the fields the overlay and layout paths need are deserialized;
//! everything else in the responses is ignored.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use solar_common::{GeoPoint, GeoRectangle};
use tracing::{debug, instrument, warn};

use crate::error::SolarApiError;

pub const DEFAULT_BASE_URL: &str = "https://solar.googleapis.com/v1";

/// Layer download URLs returned by `dataLayers:get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLayerUrls {
    #[serde(default)]
    pub dsm_url: Option<String>,
    pub rgb_url: String,
    pub mask_url: String,
    pub annual_flux_url: String,
    #[serde(default)]
    pub monthly_flux_url: Option<String>,
    #[serde(default)]
    pub imagery_quality: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LatLng> for GeoPoint {
    fn from(p: LatLng) -> Self {
        GeoPoint::new(p.latitude, p.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBox {
    pub sw: LatLng,
    pub ne: LatLng,
}

impl From<LatLngBox> for GeoRectangle {
    fn from(b: LatLngBox) -> Self {
        GeoRectangle::from_corners(b.sw.into(), b.ne.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofStats {
    #[serde(default)]
    pub area_meters2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarPotential {
    #[serde(default)]
    pub max_array_panels_count: Option<u32>,
    #[serde(default)]
    pub whole_roof_stats: Option<RoofStats>,
    #[serde(default)]
    pub max_sunshine_hours_per_year: Option<f64>,
}

/// The building closest to a point, from `buildingInsights:findClosest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingInsights {
    #[serde(default)]
    pub name: Option<String>,
    pub center: LatLng,
    pub bounding_box: LatLngBox,
    #[serde(default)]
    pub solar_potential: Option<SolarPotential>,
}

impl BuildingInsights {
    pub fn center_point(&self) -> GeoPoint {
        self.center.into()
    }

    pub fn bounds(&self) -> GeoRectangle {
        self.bounding_box.into()
    }

    /// Whole-roof area in square metres, when reported.
    pub fn roof_area_m2(&self) -> Option<f64> {
        self.solar_potential
            .as_ref()
            .and_then(|p| p.whole_roof_stats.as_ref())
            .map(|s| s.area_meters2)
    }
}

#[derive(Debug, Clone)]
pub struct SolarApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SolarApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, SolarApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request URL for an endpoint. Coordinates are sent with 5 decimals.
    pub fn endpoint_url(
        &self,
        method: &str,
        center: GeoPoint,
        extra: &[(&str, String)],
    ) -> Result<Url, SolarApiError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, method))
            .map_err(|e| SolarApiError::Request(format!("invalid base URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("location.latitude", &format!("{:.5}", center.lat))
                .append_pair("location.longitude", &format!("{:.5}", center.lng));
            for (k, v) in extra {
                query.append_pair(k, v);
            }
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        Ok(url)
    }

    /// Layer URLs for the area around `center`.
    #[instrument(skip(self), fields(lat = center.lat, lng = center.lng))]
    pub async fn data_layers(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<DataLayerUrls, SolarApiError> {
        let url = self.endpoint_url(
            "dataLayers:get",
            center,
            &[
                ("radius_meters", radius_m.to_string()),
                ("required_quality", "LOW".to_string()),
            ],
        )?;
        let layers: DataLayerUrls = self.get_json(url).await?;
        debug!(quality = ?layers.imagery_quality, "Received data layer URLs");
        Ok(layers)
    }

    /// The building closest to `center`.
    #[instrument(skip(self), fields(lat = center.lat, lng = center.lng))]
    pub async fn building_insights(&self, center: GeoPoint) -> Result<BuildingInsights, SolarApiError> {
        let url = self.endpoint_url(
            "buildingInsights:findClosest",
            center,
            &[("requiredQuality", "HIGH".to_string())],
        )?;
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SolarApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Solar API request rejected");
            return Err(SolarApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SolarApiError::Decode(e.to_string()))
    }
}
