//! Solar panel capacity and grid layout on a spherical Earth.
//!
//! - [`capacity`]: how many panels fit in an area or polygon
//! - [`grid`]: row-major panel footprints around an anchor point
//! - [`spec`]: panel dimensions and spacing

pub mod capacity;
pub mod error;
pub mod grid;
pub mod spec;

pub use capacity::{max_panel_capacity, polygon_capacity};
pub use error::{LayoutError, LayoutResult};
pub use grid::{
    layout_panels, layout_panels_in_rectangle, ColumnPlacement, PanelFootprint, PanelGrid,
    PanelLayout, MAX_LAYOUT_PANELS,
};
pub use spec::PanelSpec;
