//! Concurrent layer fetching and overlay rendering.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use geotiff_parser::{RasterFetcher, RasterResult};
use metrics::{counter, histogram};
use renderer::{
    render_palette, render_true_color, Palette, PaletteName, PixelSurface, ValueRange,
};
use serde::{Deserialize, Serialize};
use solar_common::{Classify, GeoRaster, GeoRectangle};
use tracing::{debug, info, warn};

use crate::config::{LayerStyle, SolarConfig};
use crate::error::OverlayError;
use crate::solar_client::DataLayerUrls;

/// Raster layers served by `dataLayers:get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    Rgb,
    AnnualFlux,
    MonthlyFlux,
    Dsm,
    Mask,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Rgb => "rgb",
            LayerKind::AnnualFlux => "annualFlux",
            LayerKind::MonthlyFlux => "monthlyFlux",
            LayerKind::Dsm => "dsm",
            LayerKind::Mask => "mask",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rgb" => Ok(LayerKind::Rgb),
            "annualFlux" => Ok(LayerKind::AnnualFlux),
            "monthlyFlux" => Ok(LayerKind::MonthlyFlux),
            "dsm" => Ok(LayerKind::Dsm),
            "mask" => Ok(LayerKind::Mask),
            other => Err(format!("unknown layer '{}'", other)),
        }
    }
}

/// Which optional layers to download alongside mask, rgb and annual flux.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerRequest {
    pub monthly_flux: bool,
    pub dsm: bool,
}

impl LayerRequest {
    /// Optional layers needed to render `kind`.
    pub fn for_kind(kind: LayerKind) -> Self {
        Self {
            monthly_flux: kind == LayerKind::MonthlyFlux,
            dsm: kind == LayerKind::Dsm,
        }
    }
}

/// Outcome of fetching each layer. Every result stands alone: one failed
/// layer does not discard the others.
#[derive(Debug)]
pub struct LayerSet {
    pub mask: RasterResult<GeoRaster>,
    pub rgb: RasterResult<GeoRaster>,
    pub annual_flux: RasterResult<GeoRaster>,
    pub monthly_flux: Option<RasterResult<GeoRaster>>,
    pub dsm: Option<RasterResult<GeoRaster>>,
}

impl LayerSet {
    /// The decoded layer, or why it is not available.
    pub fn get(&self, kind: LayerKind) -> Result<&GeoRaster, OverlayError> {
        let slot = match kind {
            LayerKind::Mask => Some(&self.mask),
            LayerKind::Rgb => Some(&self.rgb),
            LayerKind::AnnualFlux => Some(&self.annual_flux),
            LayerKind::MonthlyFlux => self.monthly_flux.as_ref(),
            LayerKind::Dsm => self.dsm.as_ref(),
        };
        match slot {
            Some(Ok(raster)) => Ok(raster),
            Some(Err(e)) => Err(OverlayError::DependencyUnavailable {
                layer: kind,
                class: e.class(),
                reason: e.to_string(),
            }),
            None => Err(OverlayError::NotFetched(kind)),
        }
    }
}

/// Fetch mask, rgb and annual flux (plus any requested optional layers)
/// concurrently.
pub async fn fetch_layers(
    fetcher: &RasterFetcher,
    urls: &DataLayerUrls,
    request: LayerRequest,
) -> LayerSet {
    let (mask, rgb, annual_flux, monthly_flux, dsm) = tokio::join!(
        fetch_one(fetcher, LayerKind::Mask, &urls.mask_url),
        fetch_one(fetcher, LayerKind::Rgb, &urls.rgb_url),
        fetch_one(fetcher, LayerKind::AnnualFlux, &urls.annual_flux_url),
        fetch_optional(
            fetcher,
            request.monthly_flux,
            LayerKind::MonthlyFlux,
            urls.monthly_flux_url.as_deref()
        ),
        fetch_optional(fetcher, request.dsm, LayerKind::Dsm, urls.dsm_url.as_deref()),
    );

    LayerSet {
        mask,
        rgb,
        annual_flux,
        monthly_flux,
        dsm,
    }
}

async fn fetch_optional(
    fetcher: &RasterFetcher,
    wanted: bool,
    kind: LayerKind,
    url: Option<&str>,
) -> Option<RasterResult<GeoRaster>> {
    match (wanted, url) {
        (true, Some(url)) => Some(fetch_one(fetcher, kind, url).await),
        _ => None,
    }
}

async fn fetch_one(fetcher: &RasterFetcher, kind: LayerKind, url: &str) -> RasterResult<GeoRaster> {
    let start = Instant::now();
    let result = fetcher.decode_raster(url).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    histogram!("layer_fetch_duration_ms", "layer" => kind.as_str()).record(elapsed_ms);
    match &result {
        Ok(raster) => {
            counter!("layer_fetches_total", "layer" => kind.as_str(), "outcome" => "ok").increment(1);
            debug!(
                layer = %kind,
                width = raster.width(),
                height = raster.height(),
                bands = raster.band_count(),
                elapsed_ms,
                "Layer decoded"
            );
        }
        Err(e) => {
            let class = e.class();
            let outcome = if class.is_retryable() {
                "transient"
            } else {
                "unavailable"
            };
            counter!("layer_fetches_total", "layer" => kind.as_str(), "outcome" => outcome)
                .increment(1);
            warn!(layer = %kind, error = %e, class = ?class, "Layer unavailable");
        }
    }
    result
}

/// A rendered layer ready to place on a map.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub layer: LayerKind,
    pub bounds: GeoRectangle,
    pub opacity: f32,
    /// Value range the palette was stretched over; `None` for true color
    pub range: Option<ValueRange>,
    pub masked: bool,
    pub surface: PixelSurface,
}

/// Options for [`render_overlay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayOptions {
    /// Only show pixels inside the roof mask
    pub roof_only: bool,
    /// Band of a multi-band layer, e.g. the month of monthly flux
    pub band: usize,
}

/// Render `kind` from already-fetched layers.
///
/// The layer itself must be present. With `roof_only`, a mask that failed to
/// load is skipped with a warning and the overlay is drawn unmasked.
pub fn render_overlay(
    layers: &LayerSet,
    kind: LayerKind,
    options: OverlayOptions,
    config: &SolarConfig,
) -> Result<Overlay, OverlayError> {
    let data = layers.get(kind)?;
    let style = config.style(kind);

    let mask = if options.roof_only && kind != LayerKind::Mask {
        match layers.get(LayerKind::Mask) {
            Ok(mask) => Some(mask),
            Err(e) => {
                warn!(layer = %kind, error = %e, "Mask unavailable, rendering without it");
                counter!("overlay_mask_fallbacks_total").increment(1);
                None
            }
        }
    } else {
        None
    };

    let start = Instant::now();
    let (surface, range) = match kind {
        LayerKind::Rgb => (render_true_color(data, mask)?, None),
        _ => {
            let spec = style
                .palette
                .clone()
                .or_else(|| LayerStyle::builtin(kind).palette);
            let palette = match spec {
                Some(spec) => spec.build()?,
                None => Palette::named(PaletteName::Iron),
            };
            let range = match style.fixed_range() {
                Some(range) => range,
                None => ValueRange::of_band(data, options.band)?,
            };
            let surface = render_palette(data, &palette, range.min, range.max, mask, options.band)?;
            (surface, Some(range))
        }
    };

    histogram!("overlay_render_duration_ms", "layer" => kind.as_str())
        .record(start.elapsed().as_secs_f64() * 1000.0);
    counter!("overlay_renders_total", "layer" => kind.as_str()).increment(1);
    info!(
        layer = %kind,
        width = surface.width(),
        height = surface.height(),
        masked = mask.is_some(),
        "Rendered overlay"
    );

    Ok(Overlay {
        layer: kind,
        bounds: data.bounds(),
        opacity: style.opacity,
        range,
        masked: mask.is_some(),
        surface,
    })
}
