//! 256-entry color palettes interpolated from hex anchors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> RenderResult<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RenderError::InvalidColorFormat(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| RenderError::InvalidColorFormat(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A 256-entry gradient. Entry 0 is the first anchor, entry 255 the last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Rgb>,
}

impl Palette {
    pub const SIZE: usize = 256;

    /// Build from hex anchors (`#rrggbb` or `rrggbb`).
    pub fn from_hex<S: AsRef<str>>(anchors: &[S]) -> RenderResult<Self> {
        let colors = anchors
            .iter()
            .map(|hex| Rgb::from_hex(hex.as_ref()))
            .collect::<RenderResult<Vec<_>>>()?;
        Self::from_colors(&colors)
    }

    pub fn from_colors(anchors: &[Rgb]) -> RenderResult<Self> {
        if anchors.is_empty() {
            return Err(RenderError::InvalidColorFormat(
                "palette needs at least one anchor color".to_string(),
            ));
        }
        Ok(Self::interpolate(anchors))
    }

    pub fn named(name: PaletteName) -> Self {
        Self::interpolate(name.anchors())
    }

    // Entry i sits at position i * (n - 1) / 255 along the anchor list and
    // blends the anchors on either side. `anchors` is non-empty.
    fn interpolate(anchors: &[Rgb]) -> Self {
        let step = (anchors.len() - 1) as f64 / (Self::SIZE - 1) as f64;
        let entries = (0..Self::SIZE)
            .map(|i| {
                let index = i as f64 * step;
                let lower = anchors[index.floor() as usize];
                let upper = anchors[(index.ceil() as usize).min(anchors.len() - 1)];
                let t = index - index.floor();
                Rgb::new(
                    lerp(lower.r, upper.r, t),
                    lerp(lower.g, upper.g, t),
                    lerp(lower.b, upper.b, t),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, index: u8) -> Rgb {
        self.entries[index as usize]
    }

    /// Color for a value already normalized to `[0, 1]`.
    pub fn lookup(&self, normalized: f32) -> Rgb {
        let index = (normalized.clamp(0.0, 1.0) * 255.0).round() as usize;
        self.entries[index.min(Self::SIZE - 1)]
    }

    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }
}

fn lerp(from: u8, to: u8, t: f64) -> u8 {
    (from as f64 + (to as f64 - from as f64) * t).round() as u8
}

/// Built-in anchor ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteName {
    /// Thermal-camera ramp for solar flux
    Iron,
    /// Dark to amber, for hours of sunshine
    Sunlight,
    Rainbow,
    /// Two-tone, for masks
    Binary,
}

const IRON: [Rgb; 5] = [
    Rgb::new(0x00, 0x00, 0x0a),
    Rgb::new(0x91, 0x00, 0x9c),
    Rgb::new(0xe6, 0x46, 0x16),
    Rgb::new(0xfe, 0xb4, 0x00),
    Rgb::new(0xff, 0xff, 0xf6),
];
const SUNLIGHT: [Rgb; 2] = [Rgb::new(0x21, 0x21, 0x21), Rgb::new(0xff, 0xca, 0x28)];
const RAINBOW: [Rgb; 5] = [
    Rgb::new(0x39, 0x49, 0xab),
    Rgb::new(0x81, 0xd4, 0xfa),
    Rgb::new(0x66, 0xbb, 0x6a),
    Rgb::new(0xff, 0xe0, 0x82),
    Rgb::new(0xe5, 0x39, 0x35),
];
const BINARY: [Rgb; 2] = [Rgb::new(0x21, 0x21, 0x21), Rgb::new(0xb3, 0xe5, 0xfc)];

impl PaletteName {
    pub fn anchors(&self) -> &'static [Rgb] {
        match self {
            PaletteName::Iron => &IRON,
            PaletteName::Sunlight => &SUNLIGHT,
            PaletteName::Rainbow => &RAINBOW,
            PaletteName::Binary => &BINARY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteName::Iron => "iron",
            PaletteName::Sunlight => "sunlight",
            PaletteName::Rainbow => "rainbow",
            PaletteName::Binary => "binary",
        }
    }
}

impl FromStr for PaletteName {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iron" => Ok(PaletteName::Iron),
            "sunlight" => Ok(PaletteName::Sunlight),
            "rainbow" => Ok(PaletteName::Rainbow),
            "binary" => Ok(PaletteName::Binary),
            other => Err(RenderError::InvalidColorFormat(format!(
                "unknown palette '{}'",
                other
            ))),
        }
    }
}
