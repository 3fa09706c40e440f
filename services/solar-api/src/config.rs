//! Service configuration: overlay styles and panel layout defaults.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use panel_layout::{ColumnPlacement, PanelSpec};
use renderer::{Palette, PaletteName, RenderError, ValueRange};
use serde::Deserialize;
use tracing::{info, warn};

use crate::layers::LayerKind;

/// Search radius for `dataLayers:get`, metres.
pub const DEFAULT_RADIUS_METERS: f64 = 50.0;

/// Suggested ground overlay opacity.
pub const DEFAULT_OPACITY: f32 = 0.8;

/// A palette given by name or as hex anchors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PaletteSpec {
    Named(PaletteName),
    Anchors(Vec<String>),
}

impl PaletteSpec {
    pub fn build(&self) -> Result<Palette, RenderError> {
        match self {
            PaletteSpec::Named(name) => Ok(Palette::named(*name)),
            PaletteSpec::Anchors(anchors) => Palette::from_hex(anchors),
        }
    }
}

/// How one layer is drawn.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerStyle {
    /// Ignored for true-color layers
    #[serde(default)]
    pub palette: Option<PaletteSpec>,
    #[serde(default)]
    pub min: Option<f32>,
    #[serde(default)]
    pub max: Option<f32>,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_opacity() -> f32 {
    DEFAULT_OPACITY
}

impl LayerStyle {
    fn palette(name: PaletteName, range: Option<(f32, f32)>, opacity: f32) -> Self {
        Self {
            palette: Some(PaletteSpec::Named(name)),
            min: range.map(|r| r.0),
            max: range.map(|r| r.1),
            opacity,
        }
    }

    /// Built-in style for a layer.
    pub fn builtin(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Rgb => Self {
                palette: None,
                min: None,
                max: None,
                opacity: DEFAULT_OPACITY,
            },
            LayerKind::AnnualFlux => {
                Self::palette(PaletteName::Iron, Some((0.0, 1800.0)), DEFAULT_OPACITY)
            }
            LayerKind::MonthlyFlux => {
                Self::palette(PaletteName::Iron, Some((0.0, 200.0)), DEFAULT_OPACITY)
            }
            LayerKind::Dsm => Self::palette(PaletteName::Rainbow, None, DEFAULT_OPACITY),
            LayerKind::Mask => Self::palette(PaletteName::Binary, Some((0.0, 1.0)), 0.6),
        }
    }

    /// Fixed range if both ends are configured.
    pub fn fixed_range(&self) -> Option<ValueRange> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(ValueRange::new(min, max)),
            _ => None,
        }
    }
}

/// Contents of `config/layers.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolarConfig {
    pub radius_meters: f64,
    pub layers: HashMap<LayerKind, LayerStyle>,
    pub panels: PanelSpec,
    pub column_placement: ColumnPlacement,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            layers: HashMap::new(),
            panels: PanelSpec::default(),
            column_placement: ColumnPlacement::default(),
        }
    }
}

impl SolarConfig {
    /// Load from a YAML file. A missing file gives the built-in defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Style config not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse: {}", path.display()))?;

        info!(
            path = %path.display(),
            layers = config.layers.len(),
            "Loaded style config"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject palettes and panel specs that would only fail at request time.
    pub fn validate(&self) -> Result<()> {
        for (kind, style) in &self.layers {
            if let Some(palette) = &style.palette {
                palette
                    .build()
                    .with_context(|| format!("Invalid palette for layer {}", kind.as_str()))?;
            }
        }
        self.panels.validate().context("Invalid panel spec")?;
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            anyhow::bail!("radius_meters must be positive, got {}", self.radius_meters);
        }
        Ok(())
    }

    /// Configured style for `kind`, or the built-in one.
    pub fn style(&self, kind: LayerKind) -> LayerStyle {
        self.layers
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| LayerStyle::builtin(kind))
    }
}
