//! Compositing rasters into RGBA surfaces.
//!
//! Two entry points:
//! - [`render_true_color`]: three color bands, optionally alpha-masked.
//! - [`render_palette`]: one scalar band mapped through a [`Palette`].
//!
//! Both are pure. Output rows are filled in parallel and the surface is only
//! returned once complete.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use solar_common::GeoRaster;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::palette::Palette;
use crate::surface::PixelSurface;

/// Inclusive value range used to normalize scalar data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Finite min/max of a band. A band with no finite samples yields `0..0`.
    pub fn of_band(raster: &GeoRaster, band: usize) -> RenderResult<Self> {
        let data = band_or_missing(raster, band)?;
        let (min, max) = data
            .par_iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |(lo, hi), v| (lo.min(v), hi.max(v)),
            )
            .reduce(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |(a, b), (c, d)| (a.min(c), b.max(d)),
            );

        if min > max {
            return Ok(Self::new(0.0, 0.0));
        }
        Ok(Self::new(min, max))
    }

    /// Map a value into `[0, 1]`. NaN and a zero-width range give 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if value.is_nan() || span == 0.0 || !span.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Composite the first three bands of `rgb` into RGBA.
///
/// With a mask, the output takes the mask's dimensions; color is resampled
/// nearest-neighbour from `rgb` while alpha is the mask's band 0 at the same
/// output pixel, scaled by 255.
pub fn render_true_color(rgb: &GeoRaster, mask: Option<&GeoRaster>) -> RenderResult<PixelSurface> {
    if rgb.band_count() < 3 {
        return Err(RenderError::MissingBand {
            index: rgb.band_count(),
            available: rgb.band_count(),
        });
    }
    let (red, green, blue) = (&rgb.bands()[0], &rgb.bands()[1], &rgb.bands()[2]);

    let (out_width, out_height) = match mask {
        Some(m) => (m.width(), m.height()),
        None => (rgb.width(), rgb.height()),
    };
    let alpha = mask.and_then(|m| m.band(0));

    let dw = rgb.width() as f64 / out_width as f64;
    let dh = rgb.height() as f64 / out_height as f64;
    let src_width = rgb.width();

    let mut pixels = vec![0u8; out_width * out_height * 4];
    pixels
        .par_chunks_mut(out_width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = ((y as f64 * dh).floor() as usize).min(rgb.height() - 1) * src_width;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let src = src_row + ((x as f64 * dw).floor() as usize).min(src_width - 1);
                px[0] = to_channel(red[src]);
                px[1] = to_channel(green[src]);
                px[2] = to_channel(blue[src]);
                px[3] = match alpha {
                    Some(a) => to_channel(a[y * out_width + x] * 255.0),
                    None => 255,
                };
            }
        });

    debug!(
        width = out_width,
        height = out_height,
        masked = mask.is_some(),
        "Rendered true-color surface"
    );
    PixelSurface::new(out_width, out_height, pixels)
}

/// Map one scalar band through `palette` and composite it like true color.
///
/// `normalized = clamp((v - min) / (max - min), 0, 1)`, then palette entry
/// `round(normalized * 255)`.
pub fn render_palette(
    data: &GeoRaster,
    palette: &Palette,
    min: f32,
    max: f32,
    mask: Option<&GeoRaster>,
    band_index: usize,
) -> RenderResult<PixelSurface> {
    let band = band_or_missing(data, band_index)?;
    let range = ValueRange::new(min, max);

    let colors: Vec<_> = band
        .par_iter()
        .map(|v| palette.lookup(range.normalize(*v)))
        .collect();
    let red = colors.iter().map(|c| c.r as f32).collect();
    let green = colors.iter().map(|c| c.g as f32).collect();
    let blue = colors.iter().map(|c| c.b as f32).collect();

    let rgb = data.with_bands(vec![red, green, blue])?;
    render_true_color(&rgb, mask)
}

fn band_or_missing(raster: &GeoRaster, index: usize) -> RenderResult<&[f32]> {
    raster.band(index).ok_or(RenderError::MissingBand {
        index,
        available: raster.band_count(),
    })
}

/// Clamp to a byte; NaN becomes 0.
#[inline]
fn to_channel(value: f32) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.clamp(0.0, 255.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_channel() {
        assert_eq!(to_channel(f32::NAN), 0);
        assert_eq!(to_channel(-4.0), 0);
        assert_eq!(to_channel(300.0), 255);
        assert_eq!(to_channel(127.6), 128);
    }

    #[test]
    fn test_normalize() {
        let range = ValueRange::new(0.0, 1800.0);
        assert_eq!(range.normalize(900.0), 0.5);
        assert_eq!(range.normalize(-10.0), 0.0);
        assert_eq!(range.normalize(5000.0), 1.0);
        assert_eq!(range.normalize(f32::NAN), 0.0);
        assert_eq!(ValueRange::new(5.0, 5.0).normalize(5.0), 0.0);
    }
}
