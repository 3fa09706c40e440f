//! Application state shared by every handler.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use geotiff_parser::{FetchConfig, RasterFetcher, DEFAULT_IMAGERY_HOST};
use reqwest::Client;
use tracing::info;

use crate::config::SolarConfig;
use crate::solar_client::{SolarApiClient, DEFAULT_BASE_URL};

/// Settings resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub solar_api_base_url: String,
    pub imagery_host: String,
    pub styles_path: PathBuf,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            solar_api_base_url: DEFAULT_BASE_URL.to_string(),
            imagery_host: DEFAULT_IMAGERY_HOST.to_string(),
            styles_path: PathBuf::from("config/layers.yaml"),
            request_timeout: Duration::from_secs(60),
        }
    }
}

pub struct AppState {
    pub solar: SolarApiClient,
    pub fetcher: RasterFetcher,
    pub config: SolarConfig,
}

impl AppState {
    pub fn new(solar: SolarApiClient, fetcher: RasterFetcher, config: SolarConfig) -> Self {
        Self {
            solar,
            fetcher,
            config,
        }
    }

    /// Build clients and load the style config. Both clients share one
    /// connection pool.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = SolarConfig::load(&settings.styles_path)?;

        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        let solar = SolarApiClient::with_client(
            client.clone(),
            settings.solar_api_base_url.clone(),
            settings.api_key.clone(),
        );
        let fetcher = RasterFetcher::with_client(
            client,
            FetchConfig {
                api_key: settings.api_key.clone(),
                imagery_host: settings.imagery_host.clone(),
                request_timeout: settings.request_timeout,
            },
        );

        info!(
            solar_api = %solar.base_url(),
            imagery_host = %settings.imagery_host,
            has_api_key = settings.api_key.is_some(),
            "Application state initialized"
        );
        Ok(Self::new(solar, fetcher, config))
    }
}
