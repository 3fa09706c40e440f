//! Rendered RGBA images.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{RenderError, RenderResult};
use crate::png;

/// An owned RGBA8 image, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl PixelSurface {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> RenderResult<Self> {
        if pixels.len() != width * height * 4 {
            return Err(RenderError::Shape(format!(
                "{} bytes for a {}x{} RGBA surface",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA at (x, y), or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        png::encode_auto(&self.pixels, self.width, self.height)
    }

    /// `data:image/png;base64,...` for use as an image source.
    pub fn to_data_uri(&self) -> RenderResult<String> {
        Ok(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(self.encode_png()?)
        ))
    }
}
