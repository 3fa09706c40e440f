//! Synthetic raster generators.
//!
//! These produce predictable, verifiable sample patterns that can be used
//! across the test suite.

use solar_common::{GeoRaster, GeoRectangle};

/// Creates a band where each sample is `col * 1000 + row`.
///
/// Makes it easy to verify that data was read in the right order:
/// `band[row * width + col] == col * 1000 + row`.
///
/// ```
/// use test_utils::create_indexed_band;
///
/// let band = create_indexed_band(10, 5);
/// assert_eq!(band.len(), 50);
/// assert_eq!(band[1], 1000.0);  // col=1, row=0
/// assert_eq!(band[10], 1.0);    // col=0, row=1
/// ```
pub fn create_indexed_band(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a left-to-right ramp from `min` (first column) to `max` (last column).
pub fn create_gradient_band(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let span = (width.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(min + (max - min) * col as f32 / span);
        }
    }
    data
}

/// Creates annual-flux-like values (kWh/kW/year) between 0 and 1800.
///
/// Brightest in the center, falling off towards the edges like a roof
/// surrounded by shaded ground.
pub fn create_flux_band(width: usize, height: usize) -> Vec<f32> {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt().max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 + 0.5 - cx;
            let dy = row as f32 + 0.5 - cy;
            let falloff = 1.0 - (dx * dx + dy * dy).sqrt() / max_dist;
            data.push(1800.0 * falloff.clamp(0.0, 1.0));
        }
    }
    data
}

/// Creates a 0/1 mask covering the left half of the tile.
pub fn create_half_mask(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(if col < width / 2 { 1.0 } else { 0.0 });
        }
    }
    data
}

/// Creates a band with NaN sprinkled through it (every `stride`th sample).
pub fn create_band_with_nan(width: usize, height: usize, stride: usize) -> Vec<f32> {
    create_indexed_band(width, height)
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i % stride.max(1) == 0 { f32::NAN } else { v })
        .collect()
}

/// Single-band raster over [`crate::fixtures::bounds::PALO_ALTO`].
pub fn create_scalar_raster(width: usize, height: usize, band: Vec<f32>) -> GeoRaster {
    GeoRaster::new(width, height, vec![band], crate::fixtures::bounds::PALO_ALTO)
        .expect("valid scalar raster")
}

/// Three-band raster where red follows the column, green the row, blue is fixed.
pub fn create_rgb_raster(width: usize, height: usize, bounds: GeoRectangle) -> GeoRaster {
    let mut red = Vec::with_capacity(width * height);
    let mut green = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            red.push((col * 255 / width.max(1)) as f32);
            green.push((row * 255 / height.max(1)) as f32);
        }
    }
    let blue = vec![128.0; width * height];
    GeoRaster::new(width, height, vec![red, green, blue], bounds).expect("valid rgb raster")
}

/// Mask raster (band 0) built from [`create_half_mask`].
pub fn create_mask_raster(width: usize, height: usize, bounds: GeoRectangle) -> GeoRaster {
    GeoRaster::new(width, height, vec![create_half_mask(width, height)], bounds)
        .expect("valid mask raster")
}
