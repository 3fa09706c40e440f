//! Downloading layer GeoTIFFs from the imagery service.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Url};
use solar_common::GeoRaster;
use tracing::{debug, instrument, warn};

use crate::decode::decode_geotiff;
use crate::error::{RasterError, RasterResult};

/// Host whose layer URLs need the API key attached.
pub const DEFAULT_IMAGERY_HOST: &str = "solar.googleapis.com";

/// Configuration for [`RasterFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Credential appended as `key=` to imagery-host URLs
    pub api_key: Option<String>,
    /// Host that receives the credential; other hosts get the URL untouched
    pub imagery_host: String,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            imagery_host: DEFAULT_IMAGERY_HOST.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Fetches and decodes layer rasters.
#[derive(Debug, Clone)]
pub struct RasterFetcher {
    client: Client,
    config: FetchConfig,
}

impl RasterFetcher {
    pub fn new(config: FetchConfig) -> RasterResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Use an existing client (shared connection pool).
    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// The URL actually requested: the credential is attached only for the
    /// imagery host.
    pub fn authorize_url(&self, url: &str) -> RasterResult<Url> {
        let mut parsed = Url::parse(url).map_err(|e| RasterError::InvalidUrl(format!("{}: {}", url, e)))?;
        if let Some(key) = &self.config.api_key {
            if parsed.host_str() == Some(self.config.imagery_host.as_str()) {
                parsed.query_pairs_mut().append_pair("key", key);
            }
        }
        Ok(parsed)
    }

    /// Download the raw layer bytes.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_bytes(&self, url: &str) -> RasterResult<Bytes> {
        let target = self.authorize_url(url)?;
        let response = self.client.get(target).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Raster fetch rejected");
            return Err(RasterError::FetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Raster downloaded");
        Ok(bytes)
    }

    /// Download and decode one layer.
    pub async fn decode_raster(&self, url: &str) -> RasterResult<GeoRaster> {
        let bytes = self.fetch_bytes(url).await?;
        tokio::task::spawn_blocking(move || decode_geotiff(&bytes))
            .await
            .map_err(|e| RasterError::decode(format!("decode task failed: {}", e)))?
    }
}
