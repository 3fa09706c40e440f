//! Physical panel dimensions.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};

/// Panel size and spacing in metres.
///
/// Width runs east-west, height north-south. `usable_ratio` is the share of a
/// roof's area that can hold panels once access paths and setbacks are taken
/// out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelSpec {
    pub width_m: f64,
    pub height_m: f64,
    pub spacing_m: f64,
    pub usable_ratio: f64,
}

impl Default for PanelSpec {
    fn default() -> Self {
        Self {
            width_m: 1.6,
            height_m: 1.0,
            spacing_m: 0.5,
            usable_ratio: 0.5,
        }
    }
}

impl PanelSpec {
    /// East-west distance between neighbouring column centers.
    pub fn column_pitch(&self) -> f64 {
        self.width_m + self.spacing_m
    }

    /// North-south distance between neighbouring row centers.
    pub fn row_pitch(&self) -> f64 {
        self.height_m + self.spacing_m
    }

    /// Ground area one panel claims, spacing included.
    pub fn footprint_area(&self) -> f64 {
        self.column_pitch() * self.row_pitch()
    }

    pub fn validate(&self) -> LayoutResult<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(LayoutError::InvalidSpec(format!("{} must be positive, got {}", name, v)))
            }
        };
        positive("width", self.width_m)?;
        positive("height", self.height_m)?;
        positive("usable ratio", self.usable_ratio)?;
        if !self.spacing_m.is_finite() || self.spacing_m < 0.0 {
            return Err(LayoutError::InvalidSpec(format!(
                "spacing must be non-negative, got {}",
                self.spacing_m
            )));
        }
        if self.usable_ratio > 1.0 {
            return Err(LayoutError::InvalidSpec(format!(
                "usable ratio must be at most 1, got {}",
                self.usable_ratio
            )));
        }
        Ok(())
    }
}
