//! HTTP handlers.
//!
//! - [`health`]: liveness and Prometheus metrics
//! - [`overlay`]: rendered layer overlays
//! - [`panels`]: panel layout and capacity

pub mod health;
pub mod overlay;
pub mod panels;

pub use health::{health_handler, metrics_handler};
pub use overlay::overlay_handler;
pub use panels::{capacity_area_handler, capacity_polygon_handler, panels_handler};
