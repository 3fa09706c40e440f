//! Raster rendering for map overlays.
//!
//! - [`palette`]: 256-entry gradients built from hex anchors
//! - [`compositor`]: true-color and palette compositing into RGBA
//! - [`surface`]: the rendered image, with PNG / data-URI output
//! - [`png`]: indexed or RGBA PNG encoding

pub mod compositor;
pub mod error;
pub mod palette;
pub mod png;
pub mod surface;

pub use compositor::{render_palette, render_true_color, ValueRange};
pub use error::{RenderError, RenderResult};
pub use palette::{Palette, PaletteName, Rgb};
pub use surface::PixelSurface;
